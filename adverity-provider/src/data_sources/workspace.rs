//! adverity_workspace data source: look up a workspace by slug

use adverity_core::provider::ProviderResult;
use adverity_core::resource::{Resource, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::provider::AdverityProvider;
use crate::resources::found;
use crate::utils::Attributes;

pub const TYPE: &str = "adverity_workspace";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .with_description("Reads an existing workspace")
        .attribute(AttributeSchema::new("slug", AttributeType::String).required())
        .attribute(AttributeSchema::new("workspace_id", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("name", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("datalake_id", AttributeType::String)
                .computed()
                .with_description("Datalake URL as reported by the API"),
        )
        .attribute(AttributeSchema::new("parent_id", AttributeType::Int).computed())
}

/// A missing workspace reads as an empty result
pub async fn read(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    let slug = a.require_str("slug")?;
    let mut attributes = resource.attributes.clone();

    if let Some(workspace) = found(provider.client().read_workspace(slug).await)? {
        attributes.insert("workspace_id".to_string(), Value::Int(workspace.id));
        attributes.insert("name".to_string(), Value::String(workspace.name));
        attributes.insert("datalake_id".to_string(), Value::String(workspace.datalake));
        if let Some(parent_id) = workspace.parent_id {
            attributes.insert("parent_id".to_string(), Value::Int(parent_id));
        }
        attributes.insert("slug".to_string(), Value::String(workspace.slug));
    }
    Ok(State::existing(resource.id.clone(), attributes))
}
