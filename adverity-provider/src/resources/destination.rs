//! adverity_destination: a warehouse destination (BigQuery style project/dataset)

use std::collections::HashMap;

use adverity_core::provider::{ProviderError, ProviderResult};
use adverity_core::resource::{Resource, ResourceId, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use log::info;

use super::{found, imported, must_exist};
use crate::client::types::{Destination, DestinationConfig};
use crate::provider::AdverityProvider;
use crate::utils::{Attributes, identifier, import_int, split_import_id};

pub const TYPE: &str = "adverity_destination";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("stack", AttributeType::Int).required())
        .attribute(
            AttributeSchema::new("destination_type", AttributeType::Int)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("project_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("dataset_id", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("auth", AttributeType::Int)
                .required()
                .with_description("ID of the connection authorising the destination"),
        )
        .attribute(
            AttributeSchema::new("schema_mapping", AttributeType::Bool)
                .with_default(Value::Bool(false)),
        )
        .attribute(
            AttributeSchema::new("headers_formatting", AttributeType::Int)
                .with_default(Value::Int(1))
                .with_description("Column header formatting: 1, 2 or 3"),
        )
}

fn config(a: &Attributes<'_>) -> ProviderResult<DestinationConfig> {
    let headers_formatting = a.int("headers_formatting").unwrap_or(1);
    if !(1..=3).contains(&headers_formatting) {
        return Err(ProviderError::new(format!(
            "Could not create Destination. Invalid value {} for headers_formatting. Only 1, 2, or 3 is allowed.",
            headers_formatting
        )));
    }
    Ok(DestinationConfig {
        name: a.require_str("name")?.to_string(),
        stack: a.require_int("stack")?,
        project: a.require_str("project_id")?.to_string(),
        dataset: a.require_str("dataset_id")?.to_string(),
        auth: a.require_int("auth")?,
        schema_mapping: a.flag("schema_mapping"),
        headers_formatting,
    })
}

pub async fn create(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    let destination_type = a.require_int("destination_type")?;
    let config = config(&a)?;
    let created = provider
        .client()
        .create_destination(destination_type, &config)
        .await?;
    info!("Created destination {} of type {}", created.id, destination_type);

    let state = read_id(
        provider,
        &resource.id,
        destination_type,
        &created.id.to_string(),
        &resource.attributes,
    )
    .await?;
    must_exist(state, "creating destination")
}

pub async fn read(provider: &AdverityProvider, current: &State) -> ProviderResult<State> {
    let Some(id) = current.identifier.as_deref() else {
        return Ok(State::not_found(current.id.clone()));
    };
    let destination_type = Attributes::new(&current.attributes).require_int("destination_type")?;
    read_id(provider, &current.id, destination_type, id, &current.attributes).await
}

pub async fn update(provider: &AdverityProvider, from: &State, to: &Resource) -> ProviderResult<State> {
    let id = identifier(from)?;
    let a = Attributes::new(&to.attributes);
    let destination_type = a.require_int("destination_type")?;
    let config = config(&a)?;
    provider
        .client()
        .update_destination(destination_type, id, &config)
        .await?;

    let state = read_id(provider, &to.id, destination_type, id, &to.attributes).await?;
    must_exist(state, "updating destination")
}

pub async fn delete(provider: &AdverityProvider, current: &State) -> ProviderResult<()> {
    let id = identifier(current)?;
    let destination_type = Attributes::new(&current.attributes).require_int("destination_type")?;
    provider
        .client()
        .delete_destination(destination_type, id)
        .await?;
    Ok(())
}

/// Import id format: `destination_type:destination_id`
pub async fn import(provider: &AdverityProvider, id: &ResourceId, import_id: &str) -> ProviderResult<State> {
    let parts = split_import_id(import_id, &["destination_type", "destination_id"])?;
    let destination_type = import_int(parts[0], "destination_type")?;
    let mut base = HashMap::new();
    base.insert("destination_type".to_string(), Value::Int(destination_type));

    let state = read_id(provider, id, destination_type, parts[1], &base).await?;
    imported(state, import_id)
}

async fn read_id(
    provider: &AdverityProvider,
    id: &ResourceId,
    destination_type: i64,
    destination_id: &str,
    base: &HashMap<String, Value>,
) -> ProviderResult<State> {
    let read = provider
        .client()
        .read_destination(destination_type, destination_id)
        .await;
    match found(read)? {
        Some(destination) => Ok(to_state(id, base, destination_type, &destination)),
        None => Ok(State::not_found(id.clone())),
    }
}

fn to_state(
    id: &ResourceId,
    base: &HashMap<String, Value>,
    destination_type: i64,
    destination: &Destination,
) -> State {
    let mut attributes = base.clone();
    attributes.insert("name".to_string(), Value::String(destination.name.clone()));
    attributes.insert("stack".to_string(), Value::Int(destination.stack));
    attributes.insert("destination_type".to_string(), Value::Int(destination_type));
    attributes.insert(
        "project_id".to_string(),
        Value::String(destination.project.clone()),
    );
    attributes.insert(
        "dataset_id".to_string(),
        Value::String(destination.dataset.clone()),
    );
    attributes.insert("auth".to_string(), Value::Int(destination.auth));
    attributes.insert(
        "schema_mapping".to_string(),
        Value::Bool(destination.schema_mapping),
    );
    attributes.insert(
        "headers_formatting".to_string(),
        Value::Int(destination.headers_formatting),
    );
    State::existing(id.clone(), attributes).with_identifier(destination.id.to_string())
}
