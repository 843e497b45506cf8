//! adverity_storage: an external storage location

use std::collections::HashMap;

use adverity_core::provider::ProviderResult;
use adverity_core::resource::{Resource, ResourceId, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use log::info;

use super::{found, imported, must_exist};
use crate::client::types::{Storage, StorageConfig};
use crate::provider::AdverityProvider;
use crate::utils::{Attributes, identifier};

pub const TYPE: &str = "adverity_storage";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("stack", AttributeType::Int)
                .with_description("Workspace the storage belongs to; omitted when 0"),
        )
        .attribute(
            AttributeSchema::new("url", AttributeType::String)
                .required()
                .with_description("URL of the external storage location"),
        )
        .attribute(
            AttributeSchema::new("auth", AttributeType::Int)
                .required()
                .with_description("ID of the connection authorising the storage"),
        )
}

fn config(a: &Attributes<'_>) -> ProviderResult<StorageConfig> {
    Ok(StorageConfig {
        name: a.require_str("name")?.to_string(),
        stack: a.int("stack").unwrap_or(0),
        url: a.require_str("url")?.to_string(),
        auth: a.require_int("auth")?,
    })
}

pub async fn create(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let config = config(&Attributes::new(&resource.attributes))?;
    let created = provider.client().create_storage(&config).await?;
    info!("Created storage {}", created.id);

    let state = read_id(provider, &resource.id, &created.id.to_string(), &resource.attributes).await?;
    must_exist(state, "creating storage")
}

pub async fn read(provider: &AdverityProvider, current: &State) -> ProviderResult<State> {
    let Some(id) = current.identifier.as_deref() else {
        return Ok(State::not_found(current.id.clone()));
    };
    read_id(provider, &current.id, id, &current.attributes).await
}

pub async fn update(provider: &AdverityProvider, from: &State, to: &Resource) -> ProviderResult<State> {
    let id = identifier(from)?;
    let config = config(&Attributes::new(&to.attributes))?;
    provider.client().update_storage(id, &config).await?;

    let state = read_id(provider, &to.id, id, &to.attributes).await?;
    must_exist(state, "updating storage")
}

pub async fn delete(provider: &AdverityProvider, current: &State) -> ProviderResult<()> {
    provider.client().delete_storage(identifier(current)?).await?;
    Ok(())
}

pub async fn import(provider: &AdverityProvider, id: &ResourceId, storage_id: &str) -> ProviderResult<State> {
    let state = read_id(provider, id, storage_id, &HashMap::new()).await?;
    imported(state, storage_id)
}

async fn read_id(
    provider: &AdverityProvider,
    id: &ResourceId,
    storage_id: &str,
    base: &HashMap<String, Value>,
) -> ProviderResult<State> {
    let Some(storage) = found(provider.client().read_storage(storage_id).await)? else {
        return Ok(State::not_found(id.clone()));
    };
    Ok(to_state(id, base, &storage))
}

fn to_state(id: &ResourceId, base: &HashMap<String, Value>, storage: &Storage) -> State {
    let mut attributes = base.clone();
    attributes.insert("name".to_string(), Value::String(storage.name.clone()));
    attributes.insert("stack".to_string(), Value::Int(storage.stack));
    attributes.insert("url".to_string(), Value::String(storage.url.clone()));
    attributes.insert("auth".to_string(), Value::Int(storage.auth));
    State::existing(id.clone(), attributes).with_identifier(storage.id.to_string())
}
