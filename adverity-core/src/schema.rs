//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type, enabling type validation
//! before any API call is made and telling the differ which attributes force
//! replacement or are computed by the remote side.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
    /// Nested block with its own attribute schemas
    Struct {
        name: String,
        fields: Vec<AttributeSchema>,
    },
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            // References resolve at apply time; their type is checked by the API
            (_, Value::ResourceRef(_, _)) => Ok(()),
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { base, validate, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|message| TypeError::ValidationFailed { message })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Struct { fields, .. }, Value::Map(map)) => {
                for field in fields {
                    if field.required && field.default.is_none() && !map.contains_key(&field.name)
                    {
                        return Err(TypeError::MissingRequired {
                            name: field.name.clone(),
                        });
                    }
                }
                for (k, v) in map {
                    let field = fields.iter().find(|f| &f.name == k).ok_or_else(|| {
                        TypeError::UnknownAttribute { name: k.clone() }
                    })?;
                    field
                        .attr_type
                        .validate(v)
                        .map_err(|e| TypeError::Attribute {
                            name: k.clone(),
                            inner: Box::new(e),
                        })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Struct { name, .. } => name.clone(),
        }
    }

    /// Fill in defaults of nested struct fields
    fn apply_defaults(&self, value: &mut Value) {
        match (self, value) {
            (AttributeType::Struct { fields, .. }, Value::Map(map)) => {
                for field in fields {
                    if let Some(default) = &field.default
                        && !map.contains_key(&field.name)
                    {
                        map.insert(field.name.clone(), default.clone());
                    }
                    if let Some(v) = map.get_mut(&field.name) {
                        field.attr_type.apply_defaults(v);
                    }
                }
            }
            (AttributeType::List(inner), Value::List(items)) => {
                for item in items {
                    inner.apply_defaults(item);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedAttribute { name: String },

    #[error("'{name}': {inner}")]
    Attribute { name: String, inner: Box<TypeError> },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::ResourceRef(binding, attr) => format!("ResourceRef({}.{})", binding, attr),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// Changing this attribute requires destroying and recreating the resource
    pub force_new: bool,
    /// Set by the API, never by the manifest
    pub computed: bool,
    /// Masked in plan output
    pub sensitive: bool,
    /// Canonical form used when comparing desired and current values
    pub normalize: Option<fn(&Value) -> Value>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            default: None,
            description: None,
            force_new: false,
            computed: false,
            sensitive: false,
            normalize: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_normalize(mut self, normalize: fn(&Value) -> Value) -> Self {
        self.normalize = Some(normalize);
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        // Check required attributes
        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        // Type check each attribute
        for (name, value) in attributes {
            // Internal attributes (e.g. _binding)
            if name.starts_with('_') {
                continue;
            }
            match self.attributes.get(name) {
                Some(schema) if schema.computed => {
                    errors.push(TypeError::ComputedAttribute { name: name.clone() });
                }
                Some(schema) => {
                    if let Err(e) = schema.attr_type.validate(value) {
                        errors.push(TypeError::Attribute {
                            name: name.clone(),
                            inner: Box::new(e),
                        });
                    }
                }
                None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Insert defaults for optional attributes that were not set
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        for (name, schema) in &self.attributes {
            if schema.computed {
                continue;
            }
            if let Some(default) = &schema.default
                && !attributes.contains_key(name)
            {
                attributes.insert(name.clone(), default.clone());
            }
            if let Some(value) = attributes.get_mut(name) {
                schema.attr_type.apply_defaults(value);
            }
        }
    }

    /// Normalized form of a value for comparison
    pub fn normalized(&self, name: &str, value: &Value) -> Value {
        match self.attributes.get(name).and_then(|s| s.normalize) {
            Some(normalize) => normalize(value),
            None => value.clone(),
        }
    }

    pub fn is_force_new(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|s| s.force_new)
    }

    pub fn is_computed(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|s| s.computed)
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|s| s.sensitive)
    }
}

/// Schemas of every type a provider handles, split by kind
///
/// Resources and data sources share type names (`adverity_workspace` is both),
/// so they are kept in separate maps.
#[derive(Default)]
pub struct SchemaSet {
    pub resources: HashMap<String, ResourceSchema>,
    pub data_sources: HashMap<String, ResourceSchema>,
}

impl SchemaSet {
    pub fn from_types(types: &[Box<dyn crate::provider::ResourceType>]) -> Self {
        let mut set = Self::default();
        for t in types {
            let target = if t.is_data_source() {
                &mut set.data_sources
            } else {
                &mut set.resources
            };
            target.insert(t.name().to_string(), t.schema());
        }
        set
    }

    /// Schema for a resource, looked up in the map matching its kind
    pub fn get(&self, resource: &crate::resource::Resource) -> Option<&ResourceSchema> {
        if resource.is_data_source() {
            self.data_sources.get(&resource.id.resource_type)
        } else {
            self.resources.get(&resource.id.resource_type)
        }
    }
}

/// Validate that an integer lies within `min..=max`
pub fn validate_int_range(value: &Value, min: i64, max: i64) -> Result<(), String> {
    match value {
        Value::Int(n) if (min..=max).contains(n) => Ok(()),
        Value::Int(n) => Err(format!(
            "must be an integer between {} and {}, got {}",
            min, max, n
        )),
        _ => Err("Expected integer".to_string()),
    }
}

/// Validate that a string is at most `max` characters long
pub fn validate_max_length(value: &Value, max: usize) -> Result<(), String> {
    match value {
        Value::String(s) if s.chars().count() <= max => Ok(()),
        Value::String(s) => Err(format!(
            "must be under {} characters, current length: {}",
            max,
            s.chars().count()
        )),
        _ => Err("Expected string".to_string()),
    }
}

/// Validate that a string holds a JSON document
pub fn validate_json_string(value: &Value) -> Result<(), String> {
    match value {
        Value::String(s) => serde_json::from_str::<serde_json::Value>(s)
            .map(|_| ())
            .map_err(|e| format!("invalid JSON: {}", e)),
        _ => Err("Expected string".to_string()),
    }
}

/// Validate a string against a regular expression
pub fn validate_pattern(value: &Value, pattern: &str, message: &str) -> Result<(), String> {
    let re = regex::Regex::new(pattern).map_err(|e| e.to_string())?;
    match value {
        Value::String(s) if re.is_match(s) => Ok(()),
        Value::String(_) => Err(message.to_string()),
        _ => Err("Expected string".to_string()),
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// String holding a JSON document
    pub fn json_string() -> AttributeType {
        AttributeType::Custom {
            name: "JsonString".to_string(),
            base: Box::new(AttributeType::String),
            validate: validate_json_string,
        }
    }

    /// List of strings
    pub fn string_list() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::String))
    }

    /// Map of strings
    pub fn string_map() -> AttributeType {
        AttributeType::Map(Box::new(AttributeType::String))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn references_pass_type_checks() {
        let r = Value::ResourceRef("adverity_workspace.main".to_string(), "id".to_string());
        assert!(AttributeType::Int.validate(&r).is_ok());
        assert!(types::positive_int().validate(&r).is_ok());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::Enum(vec!["days".to_string(), "custom".to_string()]);
        assert!(t.validate(&Value::String("days".to_string())).is_ok());
        assert!(t.validate(&Value::String("weeks".to_string())).is_err());
    }

    #[test]
    fn validate_positive_int() {
        let t = types::positive_int();
        assert!(t.validate(&Value::Int(1)).is_ok());
        assert!(t.validate(&Value::Int(0)).is_err());
        assert!(t.validate(&Value::String("1".to_string())).is_err());
    }

    #[test]
    fn int_range_and_length_validators() {
        assert!(validate_int_range(&Value::Int(4), 1, 4).is_ok());
        let err = validate_int_range(&Value::Int(5), 1, 4).unwrap_err();
        assert_eq!(err, "must be an integer between 1 and 4, got 5");

        assert!(validate_max_length(&Value::String("abc".to_string()), 3).is_ok());
        assert!(validate_max_length(&Value::String("abcd".to_string()), 3).is_err());
    }

    #[test]
    fn json_string_type() {
        let t = types::json_string();
        assert!(t.validate(&Value::String("[]".to_string())).is_ok());
        assert!(t.validate(&Value::String("[".to_string())).is_err());
    }

    #[test]
    fn struct_fields_are_checked() {
        let t = AttributeType::Struct {
            name: "Schedule".to_string(),
            fields: vec![
                AttributeSchema::new("cron_preset", AttributeType::String).required(),
                AttributeSchema::new("time_range_preset", AttributeType::Int).required(),
            ],
        };

        let ok: HashMap<String, Value> = [
            ("cron_preset".to_string(), Value::String("daily".to_string())),
            ("time_range_preset".to_string(), Value::Int(1)),
        ]
        .into_iter()
        .collect();
        assert!(t.validate(&Value::Map(ok.clone())).is_ok());

        let mut missing = ok.clone();
        missing.remove("time_range_preset");
        assert!(matches!(
            t.validate(&Value::Map(missing)),
            Err(TypeError::MissingRequired { .. })
        ));

        let mut unknown = ok;
        unknown.insert("extra".to_string(), Value::Bool(true));
        assert!(matches!(
            t.validate(&Value::Map(unknown)),
            Err(TypeError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("count", types::positive_int()))
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool));

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("my-resource".to_string()));
        attrs.insert("count".to_string(), Value::Int(5));
        attrs.insert("enabled".to_string(), Value::Bool(true));
        attrs.insert("_binding".to_string(), Value::String("r".to_string()));

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("adverity_storage")
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        let attrs = HashMap::new();
        let result = schema.validate(&attrs);
        assert!(result.is_err());
    }

    #[test]
    fn computed_and_unknown_attributes_are_rejected() {
        let schema = ResourceSchema::new("adverity_fetch")
            .attribute(AttributeSchema::new("job_id", AttributeType::Int).computed());

        let mut attrs = HashMap::new();
        attrs.insert("job_id".to_string(), Value::Int(1));
        attrs.insert("nope".to_string(), Value::Int(1));

        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn defaults_fill_top_level_and_nested_fields() {
        let schema = ResourceSchema::new("adverity_datastream")
            .attribute(
                AttributeSchema::new("retention_type", AttributeType::Int)
                    .with_default(Value::Int(1)),
            )
            .attribute(AttributeSchema::new(
                "fetching_config",
                AttributeType::Struct {
                    name: "FetchingConfig".to_string(),
                    fields: vec![
                        AttributeSchema::new("days_to_fetch", AttributeType::Int)
                            .with_default(Value::Int(30)),
                    ],
                },
            ));

        let mut attrs = HashMap::new();
        attrs.insert("fetching_config".to_string(), Value::Map(HashMap::new()));
        schema.apply_defaults(&mut attrs);

        assert_eq!(attrs.get("retention_type"), Some(&Value::Int(1)));
        assert_eq!(
            attrs["fetching_config"].as_map().unwrap().get("days_to_fetch"),
            Some(&Value::Int(30))
        );
    }
}
