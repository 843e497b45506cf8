//! adverity_connection: credentials for one connection type

use std::collections::HashMap;

use adverity_core::provider::ProviderResult;
use adverity_core::resource::{Resource, ResourceId, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use log::info;
use serde_json::{Map, Value as Json};

use super::{found, imported, must_exist};
use crate::client::types::Connection;
use crate::provider::AdverityProvider;
use crate::utils::{Attributes, identifier, import_int, merge_parameters, split_import_id};

pub const TYPE: &str = "adverity_connection";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .with_description("A connection authorising access to a data source")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("stack", AttributeType::Int)
                .required()
                .with_description("ID of the workspace owning the connection"),
        )
        .attribute(
            AttributeSchema::new("connection_type_id", AttributeType::Int)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("connection_parameters", types::string_map())
                .with_description("Type specific fields sent alongside name and stack"),
        )
        .attribute(AttributeSchema::new("is_authorized", AttributeType::Bool).computed())
}

/// Flat body: `{name, stack: "<stack>", ...parameters}`
fn body(a: &Attributes<'_>) -> ProviderResult<Map<String, Json>> {
    let mut body = Map::new();
    body.insert(
        "name".to_string(),
        Json::String(a.require_str("name")?.to_string()),
    );
    body.insert(
        "stack".to_string(),
        Json::String(a.require_int("stack")?.to_string()),
    );
    merge_parameters(&mut body, &a.string_map("connection_parameters"));
    Ok(body)
}

pub async fn create(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    let type_id = a.require_int("connection_type_id")?;
    let created = provider
        .client()
        .create_connection(type_id, &body(&a)?)
        .await?;
    info!("Created connection {} of type {}", created.id, type_id);

    let state = read_id(
        provider,
        &resource.id,
        type_id,
        &created.id.to_string(),
        &resource.attributes,
    )
    .await?;
    must_exist(state, "creating connection")
}

pub async fn read(provider: &AdverityProvider, current: &State) -> ProviderResult<State> {
    let Some(id) = current.identifier.as_deref() else {
        return Ok(State::not_found(current.id.clone()));
    };
    let type_id = Attributes::new(&current.attributes).require_int("connection_type_id")?;
    read_id(provider, &current.id, type_id, id, &current.attributes).await
}

pub async fn update(provider: &AdverityProvider, from: &State, to: &Resource) -> ProviderResult<State> {
    let id = identifier(from)?;
    let a = Attributes::new(&to.attributes);
    let type_id = a.require_int("connection_type_id")?;
    provider
        .client()
        .update_connection(type_id, id, &body(&a)?)
        .await?;

    let state = read_id(provider, &to.id, type_id, id, &to.attributes).await?;
    must_exist(state, "updating connection")
}

pub async fn delete(provider: &AdverityProvider, current: &State) -> ProviderResult<()> {
    let id = identifier(current)?;
    let type_id = Attributes::new(&current.attributes).require_int("connection_type_id")?;
    provider.client().delete_connection(type_id, id).await?;
    Ok(())
}

/// Import id format: `connection_type:connection_id`
pub async fn import(provider: &AdverityProvider, id: &ResourceId, import_id: &str) -> ProviderResult<State> {
    let parts = split_import_id(import_id, &["connection_type", "connection_id"])?;
    let type_id = import_int(parts[0], "connection_type")?;
    let mut base = HashMap::new();
    base.insert("connection_type_id".to_string(), Value::Int(type_id));

    let state = read_id(provider, id, type_id, parts[1], &base).await?;
    imported(state, import_id)
}

async fn read_id(
    provider: &AdverityProvider,
    id: &ResourceId,
    type_id: i64,
    connection_id: &str,
    base: &HashMap<String, Value>,
) -> ProviderResult<State> {
    match found(provider.client().read_connection(type_id, connection_id).await)? {
        Some(connection) => Ok(to_state(id, base, type_id, &connection)),
        None => Ok(State::not_found(id.clone())),
    }
}

fn to_state(id: &ResourceId, base: &HashMap<String, Value>, type_id: i64, connection: &Connection) -> State {
    let mut attributes = base.clone();
    attributes.insert("name".to_string(), Value::String(connection.name.clone()));
    attributes.insert("stack".to_string(), Value::Int(connection.stack));
    attributes.insert("connection_type_id".to_string(), Value::Int(type_id));
    attributes.insert(
        "is_authorized".to_string(),
        Value::Bool(connection.is_authorized),
    );
    State::existing(id.clone(), attributes).with_identifier(connection.id.to_string())
}
