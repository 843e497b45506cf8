//! adverity_destination_mapping: routes a datastream into a destination table
//!
//! A mapping can only be created for an enabled datastream. While the
//! datastream is disabled the mapping is recorded under a `blocked-` identifier
//! and created on the first update that finds the datastream enabled.

use std::collections::HashMap;

use adverity_core::provider::ProviderResult;
use adverity_core::resource::{Resource, ResourceId, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use chrono::Utc;
use log::{info, warn};

use super::{found, imported, must_exist};
use crate::client::types::{DestinationMapping, DestinationMappingConfig};
use crate::provider::AdverityProvider;
use crate::utils::{Attributes, identifier, import_int, split_import_id};

pub const TYPE: &str = "adverity_destination_mapping";

const BLOCKED_PREFIX: &str = "blocked-";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .attribute(
            AttributeSchema::new("destination_type", AttributeType::Int)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("destination_id", AttributeType::Int)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("datastream_id", AttributeType::Int)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("table_name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("datastream_enabled", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description("Whether the mapped datastream is enabled; mappings wait for it"),
        )
}

fn is_blocked(identifier: &str) -> bool {
    identifier.starts_with(BLOCKED_PREFIX)
}

struct Target {
    destination_type: i64,
    destination_id: String,
}

impl Target {
    fn of(a: &Attributes<'_>) -> ProviderResult<Self> {
        Ok(Self {
            destination_type: a.require_int("destination_type")?,
            destination_id: a.require_int("destination_id")?.to_string(),
        })
    }
}

fn config(a: &Attributes<'_>) -> ProviderResult<DestinationMappingConfig> {
    Ok(DestinationMappingConfig {
        datastream: a.require_int("datastream_id")?,
        table_name: a.require_str("table_name")?.to_string(),
    })
}

pub async fn create(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    if !a.flag("datastream_enabled") {
        warn!(
            "[{}] Destination mapping is blocked by the datastream not being enabled, so it will not be created.",
            resource.id
        );
        let blocked = format!("{}{}", BLOCKED_PREFIX, Utc::now().timestamp_micros());
        return Ok(State::existing(resource.id.clone(), resource.attributes.clone())
            .with_identifier(blocked));
    }

    let target = Target::of(&a)?;
    let created = provider
        .client()
        .create_destination_mapping(target.destination_type, &target.destination_id, &config(&a)?)
        .await?;
    info!(
        "Created destination mapping {} on destination {}",
        created.id, target.destination_id
    );

    let state = read_id(
        provider,
        &resource.id,
        &target,
        &created.id.to_string(),
        &resource.attributes,
    )
    .await?;
    must_exist(state, "creating destination mapping")
}

pub async fn read(provider: &AdverityProvider, current: &State) -> ProviderResult<State> {
    let Some(id) = current.identifier.as_deref() else {
        return Ok(State::not_found(current.id.clone()));
    };
    if is_blocked(id) {
        return Ok(current.clone());
    }
    let target = Target::of(&Attributes::new(&current.attributes))?;
    read_id(provider, &current.id, &target, id, &current.attributes).await
}

pub async fn update(provider: &AdverityProvider, from: &State, to: &Resource) -> ProviderResult<State> {
    let id = identifier(from)?;
    if is_blocked(id) {
        return create(provider, to).await;
    }

    let a = Attributes::new(&to.attributes);
    let target = Target::of(&a)?;
    provider
        .client()
        .update_destination_mapping(
            target.destination_type,
            &target.destination_id,
            id,
            &config(&a)?,
        )
        .await?;

    let state = read_id(provider, &to.id, &target, id, &to.attributes).await?;
    must_exist(state, "updating destination mapping")
}

pub async fn delete(provider: &AdverityProvider, current: &State) -> ProviderResult<()> {
    let id = identifier(current)?;
    if is_blocked(id) {
        return Ok(());
    }
    let target = Target::of(&Attributes::new(&current.attributes))?;
    provider
        .client()
        .delete_destination_mapping(target.destination_type, &target.destination_id, id)
        .await?;
    Ok(())
}

/// Import id format: `destination_type:destination_id:mapping_id`
pub async fn import(provider: &AdverityProvider, id: &ResourceId, import_id: &str) -> ProviderResult<State> {
    let parts = split_import_id(
        import_id,
        &["destination_type", "destination_id", "destinationmapping_id"],
    )?;
    let target = Target {
        destination_type: import_int(parts[0], "destination_type")?,
        destination_id: import_int(parts[1], "destination_id")?.to_string(),
    };
    let mut base = HashMap::new();
    base.insert(
        "destination_type".to_string(),
        Value::Int(target.destination_type),
    );
    // Only enabled datastreams can have mappings
    base.insert("datastream_enabled".to_string(), Value::Bool(true));

    let state = read_id(provider, id, &target, parts[2], &base).await?;
    imported(state, import_id)
}

async fn read_id(
    provider: &AdverityProvider,
    id: &ResourceId,
    target: &Target,
    mapping_id: &str,
    base: &HashMap<String, Value>,
) -> ProviderResult<State> {
    let read = provider
        .client()
        .read_destination_mapping(target.destination_type, &target.destination_id, mapping_id)
        .await;
    match found(read)? {
        Some(mapping) => Ok(to_state(id, base, target, &mapping)),
        None => Ok(State::not_found(id.clone())),
    }
}

fn to_state(
    id: &ResourceId,
    base: &HashMap<String, Value>,
    target: &Target,
    mapping: &DestinationMapping,
) -> State {
    let mut attributes = base.clone();
    attributes.insert(
        "destination_type".to_string(),
        Value::Int(target.destination_type),
    );
    let destination_id = mapping
        .target
        .or_else(|| target.destination_id.parse().ok())
        .unwrap_or_default();
    attributes.insert("destination_id".to_string(), Value::Int(destination_id));
    attributes.insert("datastream_id".to_string(), Value::Int(mapping.datastream));
    attributes.insert(
        "table_name".to_string(),
        Value::String(mapping.table_name.clone()),
    );
    State::existing(id.clone(), attributes).with_identifier(mapping.id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_identifiers_are_recognised() {
        assert!(is_blocked("blocked-1700000000000000"));
        assert!(!is_blocked("42"));
    }
}
