//! adverity_datatype_mapping: confirms datatypes of the columns a datastream reports
//!
//! Unlike adverity_columns, the column list is owned by the API. Only types
//! are changed, and only after the connection has been authorised so that a
//! fetch could populate the columns.

use std::collections::HashMap;

use adverity_core::provider::{ProviderError, ProviderResult};
use adverity_core::resource::{Resource, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use log::{debug, info, warn};
use uuid::Uuid;

use super::normalize_schema_value;
use crate::client::types::Column;
use crate::provider::AdverityProvider;
use crate::reconcile::{SchemaColumn, merge_columns, parse_schema, reconcile, sanitize_name};
use crate::utils::Attributes;

pub const TYPE: &str = "adverity_datatype_mapping";

fn populating_block() -> AttributeType {
    AttributeType::Struct {
        name: "PopulatingSettings".to_string(),
        fields: vec![
            AttributeSchema::new("connection_authorised", AttributeType::Bool).required(),
            AttributeSchema::new("days_to_fetch", AttributeType::Int)
                .with_default(Value::Int(14)),
        ],
    }
}

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
                .with_normalize(normalize_schema_value),
        )
        .attribute(AttributeSchema::new("populating_settings", populating_block()).required())
        .attribute(AttributeSchema::new("mapped", AttributeType::Bool).computed())
        .attribute(
            AttributeSchema::new("error_on_missing_columns", AttributeType::Bool)
                .with_default(Value::Bool(false)),
        )
        .attribute(AttributeSchema::new("ignored_columns", types::string_list()))
        .attribute(
            AttributeSchema::new("wait_for_columns", AttributeType::Bool)
                .with_default(Value::Bool(true))
                .with_description("Poll until the datastream reports columns"),
        )
        .attribute(
            AttributeSchema::new("replace_special_characters", AttributeType::Bool)
                .with_default(Value::Bool(true)),
        )
}

pub async fn create(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let attributes = map(provider, resource).await?;
    Ok(State::existing(resource.id.clone(), attributes).with_identifier(Uuid::new_v4().to_string()))
}

pub async fn update(provider: &AdverityProvider, from: &State, to: &Resource) -> ProviderResult<State> {
    let attributes = map(provider, to).await?;
    let mut state = State::existing(to.id.clone(), attributes);
    state.identifier = from.identifier.clone();
    Ok(state)
}

/// Reconcile column types, or record an unmapped state while unauthorised
async fn map(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<HashMap<String, Value>> {
    let a = Attributes::new(&resource.attributes);
    let authorised = a
        .block("populating_settings")
        .is_some_and(|p| p.flag("connection_authorised"));
    let mut attributes = resource.attributes.clone();

    if !authorised {
        warn!(
            "[{}] Connection is not authorised yet, so it is not possible to populate the columns to map them.",
            resource.id
        );
        attributes.insert("mapped".to_string(), Value::Bool(false));
        return Ok(attributes);
    }

    let datastream_id = a.require_int("datastream_id")?;
    let desired = parse_schema(a.require_str("schema")?)?;
    let ignored = a.strings("ignored_columns");
    let columns = read_columns(provider, &a, datastream_id, a.flag("wait_for_columns")).await?;

    let result = reconcile(&desired, &columns, &ignored)?;
    for patch in &result.patches {
        debug!(
            "Changing column {} from type {} to type {}",
            patch.name, patch.from, patch.to
        );
        provider
            .client()
            .set_column_datatype(patch.id, patch.to)
            .await?;
    }
    info!(
        "Mapped {} column types of datastream {}",
        result.patches.len(),
        datastream_id
    );

    let messages = result.mismatch_messages();
    if a.flag("error_on_missing_columns") && !messages.is_empty() {
        return Err(ProviderError::new(messages.join("\n")));
    }
    for message in &messages {
        warn!("[{}] {}", resource.id, message);
    }

    let columns = read_columns(provider, &a, datastream_id, false).await?;
    attributes.insert(
        "schema".to_string(),
        Value::String(read_schema(&desired, &columns, &ignored)?),
    );
    attributes.insert("mapped".to_string(), Value::Bool(true));
    Ok(attributes)
}

/// Columns of the datastream, renamed when special characters are replaced
///
/// With `wait` set an empty list is polled until columns show up.
async fn read_columns(
    provider: &AdverityProvider,
    a: &Attributes<'_>,
    datastream_id: i64,
    wait: bool,
) -> ProviderResult<Vec<Column>> {
    let mut columns = provider.client().read_columns(datastream_id).await?;
    while wait && columns.is_empty() {
        info!("Waiting for datastream {} to report columns", datastream_id);
        tokio::time::sleep(provider.poll_interval()).await;
        columns = provider.client().read_columns(datastream_id).await?;
    }
    if a.flag("replace_special_characters") {
        for column in &mut columns {
            column.name = sanitize_name(&column.name);
        }
    }
    Ok(columns)
}

fn read_schema(desired: &[SchemaColumn], columns: &[Column], ignored: &[String]) -> ProviderResult<String> {
    let schema: Vec<SchemaColumn> = merge_columns(desired, columns, ignored)
        .into_iter()
        .map(|c| SchemaColumn::new(c.name, c.column_type))
        .collect();
    serde_json::to_string(&schema).map_err(|e| ProviderError::new(e.to_string()).with_cause(e))
}

/// Refreshes the schema from the API once the columns have been mapped
pub async fn read(provider: &AdverityProvider, current: &State) -> ProviderResult<State> {
    if current.identifier.is_none() {
        return Ok(State::not_found(current.id.clone()));
    }
    let a = Attributes::new(&current.attributes);
    if !a.flag("mapped") {
        return Ok(current.clone());
    }
    let datastream_id = a.require_int("datastream_id")?;
    let desired = parse_schema(a.require_str("schema")?)?;
    let columns = read_columns(provider, &a, datastream_id, false).await?;

    let mut state = current.clone();
    state.attributes.insert(
        "schema".to_string(),
        Value::String(read_schema(&desired, &columns, &a.strings("ignored_columns"))?),
    );
    Ok(state)
}

pub async fn delete(_provider: &AdverityProvider, _current: &State) -> ProviderResult<()> {
    Ok(())
}
