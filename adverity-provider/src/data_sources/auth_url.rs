//! adverity_auth_url data source: URL that authorises a connection

use adverity_core::provider::ProviderResult;
use adverity_core::resource::{Resource, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::provider::AdverityProvider;
use crate::utils::Attributes;

pub const TYPE: &str = "adverity_auth_url";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .with_description("Authorisation URL of a connection")
        .attribute(AttributeSchema::new("connection_type_id", AttributeType::Int).required())
        .attribute(AttributeSchema::new("connection_id", AttributeType::Int).required())
        .attribute(AttributeSchema::new("url", AttributeType::String).computed())
}

pub async fn read(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    let connection_type_id = a.require_int("connection_type_id")?;
    let connection_id = a.require_int("connection_id")?;

    let url = provider
        .client()
        .connection_auth_url(connection_type_id, &connection_id.to_string())
        .await?;

    let mut attributes = resource.attributes.clone();
    attributes.insert("url".to_string(), Value::String(url));
    Ok(State::existing(resource.id.clone(), attributes))
}
