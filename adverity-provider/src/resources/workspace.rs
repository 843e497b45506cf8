//! adverity_workspace: a workspace (stack), identified by its slug

use std::collections::HashMap;

use adverity_core::provider::ProviderResult;
use adverity_core::resource::{Resource, ResourceId, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use log::info;

use super::{found, imported, must_exist};
use crate::client::types::{CreateWorkspace, UpdateWorkspace, Workspace};
use crate::provider::AdverityProvider;
use crate::utils::{Attributes, identifier};

pub const TYPE: &str = "adverity_workspace";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .with_description("A workspace in which connections and datastreams live")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("datalake_id", AttributeType::String)
                .required()
                .with_description("ID of the datalake backing the workspace"),
        )
        .attribute(
            AttributeSchema::new("parent_id", AttributeType::Int)
                .with_default(Value::Int(1))
                .with_description("ID of the parent workspace"),
        )
        .attribute(AttributeSchema::new("slug", AttributeType::String).computed())
        .attribute(AttributeSchema::new("workspace_id", AttributeType::Int).computed())
}

pub async fn create(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    let body = CreateWorkspace {
        name: a.require_str("name")?.to_string(),
        datalake_id: a.string("datalake_id"),
        parent_id: a.int("parent_id").unwrap_or(1),
    };
    let created = provider.client().create_workspace(&body).await?;
    info!("Created workspace {} (id {})", created.slug, created.id);

    let state = read_slug(provider, &resource.id, &created.slug, &resource.attributes).await?;
    must_exist(state, "creating workspace")
}

pub async fn read(provider: &AdverityProvider, current: &State) -> ProviderResult<State> {
    let Some(slug) = current.identifier.as_deref() else {
        return Ok(State::not_found(current.id.clone()));
    };
    read_slug(provider, &current.id, slug, &current.attributes).await
}

pub async fn update(provider: &AdverityProvider, from: &State, to: &Resource) -> ProviderResult<State> {
    let slug = identifier(from)?;
    let a = Attributes::new(&to.attributes);
    let body = UpdateWorkspace {
        datalake_id: a.string("datalake_id"),
        parent_id: a.int("parent_id").unwrap_or(1),
        stack_slug: slug.to_string(),
        name: a.require_str("name")?.to_string(),
    };
    provider.client().update_workspace(slug, &body).await?;

    let state = read_slug(provider, &to.id, slug, &to.attributes).await?;
    must_exist(state, "updating workspace")
}

pub async fn delete(provider: &AdverityProvider, current: &State) -> ProviderResult<()> {
    provider.client().delete_workspace(identifier(current)?).await?;
    Ok(())
}

pub async fn import(provider: &AdverityProvider, id: &ResourceId, slug: &str) -> ProviderResult<State> {
    let state = read_slug(provider, id, slug, &HashMap::new()).await?;
    imported(state, slug)
}

async fn read_slug(
    provider: &AdverityProvider,
    id: &ResourceId,
    slug: &str,
    base: &HashMap<String, Value>,
) -> ProviderResult<State> {
    match found(provider.client().read_workspace(slug).await)? {
        Some(workspace) => Ok(to_state(id, base, &workspace)),
        None => Ok(State::not_found(id.clone())),
    }
}

fn to_state(id: &ResourceId, base: &HashMap<String, Value>, workspace: &Workspace) -> State {
    let mut attributes = base.clone();
    attributes.insert("name".to_string(), Value::String(workspace.name.clone()));
    attributes.insert(
        "datalake_id".to_string(),
        Value::String(workspace.datalake_id()),
    );
    if let Some(parent_id) = workspace.parent_id {
        attributes.insert("parent_id".to_string(), Value::Int(parent_id));
    }
    attributes.insert("slug".to_string(), Value::String(workspace.slug.clone()));
    attributes.insert("workspace_id".to_string(), Value::Int(workspace.id));
    State::existing(id.clone(), attributes).with_identifier(workspace.slug.clone())
}
