//! Managed resource types
//!
//! Each submodule exposes `TYPE`, `schema()` and async `create`, `read`,
//! `update` and `delete` handlers; most also support `import`. Reads merge
//! what the API reports over the attributes already known, so attributes the
//! API never echoes keep their declared value.

pub mod columns;
pub mod connection;
pub mod datastream;
pub mod datatype_mapping;
pub mod destination;
pub mod destination_mapping;
pub mod fetch;
pub mod storage;
pub mod workspace;

use adverity_core::provider::{ProviderError, ProviderResult, ResourceType};
use adverity_core::resource::{State, Value};
use adverity_core::schema::ResourceSchema;

use crate::client::AdverityError;
use crate::reconcile::normalize_schema;

macro_rules! define_resource_type {
    ($name:ident, $module:ident) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $module::TYPE
            }
            fn schema(&self) -> ResourceSchema {
                $module::schema()
            }
        }
    };
}

define_resource_type!(WorkspaceType, workspace);
define_resource_type!(ConnectionType, connection);
define_resource_type!(StorageType, storage);
define_resource_type!(DestinationType, destination);
define_resource_type!(DatastreamType, datastream);
define_resource_type!(DestinationMappingType, destination_mapping);
define_resource_type!(ColumnsType, columns);
define_resource_type!(DatatypeMappingType, datatype_mapping);
define_resource_type!(FetchType, fetch);

/// Returns all managed resource types
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(WorkspaceType),
        Box::new(ConnectionType),
        Box::new(StorageType),
        Box::new(DestinationType),
        Box::new(DatastreamType),
        Box::new(DestinationMappingType),
        Box::new(ColumnsType),
        Box::new(DatatypeMappingType),
        Box::new(FetchType),
    ]
}

/// `Ok(None)` for a 404, the value otherwise
pub(crate) fn found<T>(result: Result<T, AdverityError>) -> ProviderResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// A read-back right after a write must find the object
pub(crate) fn must_exist(state: State, action: &str) -> ProviderResult<State> {
    if state.exists {
        Ok(state)
    } else {
        Err(ProviderError::new(format!(
            "Object could not be read back after {}",
            action
        )))
    }
}

pub(crate) fn imported(state: State, import_id: &str) -> ProviderResult<State> {
    if state.exists {
        Ok(state)
    } else {
        Err(ProviderError::new(format!(
            "Cannot import '{}': no such object",
            import_id
        )))
    }
}

/// Compact `[{name, type}]` form of a schema document, for comparisons
pub(crate) fn normalize_schema_value(value: &Value) -> Value {
    match value.as_str().and_then(normalize_schema) {
        Some(normalized) => Value::String(normalized),
        None => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adverity_core::resource::ResourceId;

    #[test]
    fn type_names_are_unique() {
        let types = resource_types();
        let mut names: Vec<&str> = types.iter().map(|t| t.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), types.len());
        assert!(types.iter().all(|t| !t.is_data_source()));
    }

    #[test]
    fn schemas_carry_their_type_name() {
        for t in resource_types() {
            assert_eq!(t.schema().resource_type, t.name());
        }
    }

    #[test]
    fn not_found_becomes_none() {
        let gone: Result<(), AdverityError> = Err(AdverityError::Api {
            action: "reading storage".to_string(),
            status: 404,
            body: String::new(),
        });
        assert!(found(gone).unwrap().is_none());

        let failed: Result<(), AdverityError> = Err(AdverityError::Api {
            action: "reading storage".to_string(),
            status: 500,
            body: "boom".to_string(),
        });
        assert!(found(failed).is_err());
    }

    #[test]
    fn schema_values_normalize_to_compact_json() {
        let value = Value::String(r#"[ {"type": "DATE", "name": "day", "mode": "REQUIRED"} ]"#.to_string());
        assert_eq!(
            normalize_schema_value(&value),
            Value::String(r#"[{"name":"day","type":"DATE"}]"#.to_string())
        );
        let not_schema = Value::String("{}".to_string());
        assert_eq!(normalize_schema_value(&not_schema), not_schema);
    }

    #[test]
    fn missing_read_back_is_an_error() {
        let state = State::not_found(ResourceId::new("adverity_storage", "s"));
        let err = must_exist(state, "creating storage").unwrap_err();
        assert_eq!(err.message, "Object could not be read back after creating storage");
    }
}
