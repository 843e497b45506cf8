//! adverity_columns: the column list of a datastream, declared as a table schema

use std::collections::HashMap;

use adverity_core::provider::{ProviderError, ProviderResult};
use adverity_core::resource::{Resource, ResourceId, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use log::info;

use super::{found, imported, must_exist, normalize_schema_value};
use crate::client::types::NewColumn;
use crate::provider::AdverityProvider;
use crate::reconcile::{ReconcileError, merge_columns, parse_schema};
use crate::utils::{Attributes, identifier, import_int};

pub const TYPE: &str = "adverity_columns";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .attribute(
            AttributeSchema::new("datastream_id", AttributeType::Int)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("schema", types::json_string())
                .required()
                .with_normalize(normalize_schema_value)
                .with_description("JSON list of {name, type} columns, warehouse type names"),
        )
        .attribute(
            AttributeSchema::new("ignored_columns", types::string_list())
                .with_description("Columns left alone on both sides"),
        )
}

/// POST the non-ignored columns; every returned column must have a confirmed type
async fn push(provider: &AdverityProvider, a: &Attributes<'_>, action: &str) -> ProviderResult<i64> {
    let datastream_id = a.require_int("datastream_id")?;
    let desired = parse_schema(a.require_str("schema")?)?;
    let ignored = a.strings("ignored_columns");

    let columns = desired
        .iter()
        .filter(|c| !ignored.contains(&c.name))
        .map(|c| {
            Ok(NewColumn {
                name: c.name.clone(),
                column_type: c.adverity_type()?.to_string(),
            })
        })
        .collect::<Result<Vec<_>, ReconcileError>>()?;

    let created = provider
        .client()
        .create_columns(datastream_id, &columns)
        .await?;
    let unconfirmed: Vec<String> = created
        .iter()
        .filter(|c| !c.confirmed_type)
        .map(|c| {
            format!(
                "After {} the columns, {} has confirmedType set to false. This should not happen and is either a bug in the API or the provider.",
                action, c.name
            )
        })
        .collect();
    if !unconfirmed.is_empty() {
        return Err(ProviderError::new(unconfirmed.join("\n")));
    }
    info!("Set {} columns on datastream {}", created.len(), datastream_id);
    Ok(datastream_id)
}

pub async fn create(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let datastream_id = push(provider, &Attributes::new(&resource.attributes), "creating").await?;
    let state = read_id(provider, &resource.id, datastream_id, &resource.attributes).await?;
    must_exist(state, "creating columns")
}

pub async fn read(provider: &AdverityProvider, current: &State) -> ProviderResult<State> {
    if current.identifier.is_none() {
        return Ok(State::not_found(current.id.clone()));
    }
    let datastream_id = Attributes::new(&current.attributes).require_int("datastream_id")?;
    read_id(provider, &current.id, datastream_id, &current.attributes).await
}

pub async fn update(provider: &AdverityProvider, from: &State, to: &Resource) -> ProviderResult<State> {
    identifier(from)?;
    let datastream_id = push(provider, &Attributes::new(&to.attributes), "updating").await?;
    let state = read_id(provider, &to.id, datastream_id, &to.attributes).await?;
    must_exist(state, "updating columns")
}

/// Posting an empty list removes every column
pub async fn delete(provider: &AdverityProvider, current: &State) -> ProviderResult<()> {
    let datastream_id = Attributes::new(&current.attributes).require_int("datastream_id")?;
    let remaining = provider.client().create_columns(datastream_id, &[]).await?;
    if !remaining.is_empty() {
        return Err(ProviderError::new(
            "After sending a POST request with an empty slice, some results got returned.",
        ));
    }
    Ok(())
}

/// Import id: the datastream id
pub async fn import(provider: &AdverityProvider, id: &ResourceId, import_id: &str) -> ProviderResult<State> {
    let datastream_id = import_int(import_id, "datastream_id")?;
    let mut base = HashMap::new();
    base.insert("datastream_id".to_string(), Value::Int(datastream_id));
    base.insert("schema".to_string(), Value::String("[]".to_string()));
    base.insert("ignored_columns".to_string(), Value::List(Vec::new()));

    let state = read_id(provider, id, datastream_id, &base).await?;
    imported(state, import_id)
}

/// Columns disappear with their datastream, so its existence is checked first
async fn read_id(
    provider: &AdverityProvider,
    id: &ResourceId,
    datastream_id: i64,
    base: &HashMap<String, Value>,
) -> ProviderResult<State> {
    let client = provider.client();
    let datastream = client.read_datastream_common(&datastream_id.to_string()).await;
    if found(datastream)?.is_none() {
        return Ok(State::not_found(id.clone()));
    }

    let a = Attributes::new(base);
    let desired = match a.str("schema") {
        Some(schema) => parse_schema(schema)?,
        None => Vec::new(),
    };
    let api = client.read_columns(datastream_id).await?;
    let merged = merge_columns(&desired, &api, &a.strings("ignored_columns"));
    let schema = serde_json::to_string(&merged)
        .map_err(|e| ProviderError::new(e.to_string()).with_cause(e))?;

    let mut attributes = base.clone();
    attributes.insert("datastream_id".to_string(), Value::Int(datastream_id));
    attributes.insert("schema".to_string(), Value::String(schema));
    Ok(State::existing(id.clone(), attributes).with_identifier(datastream_id.to_string()))
}
