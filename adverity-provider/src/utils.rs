//! Attribute access and value conversion helpers shared by resource handlers

use std::collections::HashMap;

use adverity_core::provider::{ProviderError, ProviderResult};
use adverity_core::resource::{State, Value};
use serde_json::{Map, Value as Json};

/// Typed read access to an attribute map
#[derive(Clone, Copy)]
pub struct Attributes<'a> {
    map: &'a HashMap<String, Value>,
}

impl<'a> Attributes<'a> {
    pub fn new(map: &'a HashMap<String, Value>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    /// String value, empty when unset
    pub fn string(&self, key: &str) -> String {
        self.str(key).unwrap_or_default().to_string()
    }

    pub fn require_str(&self, key: &str) -> ProviderResult<&'a str> {
        self.str(key).ok_or_else(|| missing(key, "a string"))
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    pub fn require_int(&self, key: &str) -> ProviderResult<i64> {
        self.int(key).ok_or_else(|| missing(key, "an integer"))
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Boolean value, false when unset
    pub fn flag(&self, key: &str) -> bool {
        self.bool(key).unwrap_or(false)
    }

    pub fn require_bool(&self, key: &str) -> ProviderResult<bool> {
        self.bool(key).ok_or_else(|| missing(key, "a boolean"))
    }

    pub fn list(&self, key: &str) -> &'a [Value] {
        self.get(key).and_then(Value::as_list).unwrap_or_default()
    }

    pub fn strings(&self, key: &str) -> Vec<String> {
        self.list(key)
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// String map entries sorted by key
    pub fn string_map(&self, key: &str) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .get(key)
            .and_then(Value::as_map)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort();
        entries
    }

    /// Nested block stored as a map
    pub fn block(&self, key: &str) -> Option<Attributes<'a>> {
        self.get(key).and_then(Value::as_map).map(Attributes::new)
    }

    /// Every entry of a list of blocks
    pub fn blocks(&self, key: &str) -> Vec<Attributes<'a>> {
        self.list(key)
            .iter()
            .filter_map(Value::as_map)
            .map(Attributes::new)
            .collect()
    }
}

fn missing(key: &str, kind: &str) -> ProviderError {
    ProviderError::new(format!("Attribute '{}' is required and must be {}", key, kind))
}

/// Remote identifier recorded in a state
pub fn identifier(state: &State) -> ProviderResult<&str> {
    state
        .identifier
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ProviderError::new("Resource has no identifier in state"))
}

/// Split `a:b[:c]` import ids into exactly `expected.len()` non-empty parts
pub fn split_import_id<'a>(import_id: &'a str, expected: &[&str]) -> ProviderResult<Vec<&'a str>> {
    let parts: Vec<&str> = import_id.splitn(expected.len(), ':').collect();
    if parts.len() != expected.len() || parts.iter().any(|p| p.is_empty()) {
        return Err(ProviderError::new(format!(
            "unexpected format of ID ({}), expected {}",
            import_id,
            expected.join(":")
        )));
    }
    Ok(parts)
}

/// Parse one part of an import id as an integer
pub fn import_int(part: &str, name: &str) -> ProviderResult<i64> {
    part.parse().map_err(|_| {
        ProviderError::new(format!(
            "could not convert {} ({}) to an integer",
            name, part
        ))
    })
}

/// Merge `name = value` parameters into a flat JSON body
pub fn merge_parameters(body: &mut Map<String, Json>, parameters: &[(String, String)]) {
    for (name, value) in parameters {
        body.insert(name.clone(), Json::String(value.clone()));
    }
}

pub fn string_list(values: impl IntoIterator<Item = String>) -> Value {
    Value::List(values.into_iter().map(Value::String).collect())
}

/// Map value from `(key, value)` pairs
pub fn map_value<I, K>(entries: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adverity_core::resource::ResourceId;

    fn attrs() -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::String("sales".to_string()));
        map.insert("stack".to_string(), Value::String("12".to_string()));
        map.insert("enabled".to_string(), Value::Bool(true));
        map.insert(
            "params".to_string(),
            map_value([
                ("b", Value::String("2".to_string())),
                ("a", Value::String("1".to_string())),
            ]),
        );
        map.insert("ignored".to_string(), string_list(["x".to_string()]));
        map
    }

    #[test]
    fn typed_access() {
        let map = attrs();
        let a = Attributes::new(&map);
        assert_eq!(a.require_str("name").unwrap(), "sales");
        assert_eq!(a.require_int("stack").unwrap(), 12);
        assert!(a.flag("enabled"));
        assert!(!a.flag("missing"));
        assert_eq!(a.string("missing"), "");
        assert_eq!(a.strings("ignored"), vec!["x"]);
        assert_eq!(
            a.string_map("params"),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn missing_required_attribute() {
        let map = attrs();
        let err = Attributes::new(&map).require_int("auth").unwrap_err();
        assert_eq!(err.message, "Attribute 'auth' is required and must be an integer");
    }

    #[test]
    fn import_ids_are_split() {
        let parts = split_import_id("5:42", &["connection_type", "connection_id"]).unwrap();
        assert_eq!(parts, vec!["5", "42"]);

        let err = split_import_id("5:", &["connection_type", "connection_id"]).unwrap_err();
        assert_eq!(
            err.message,
            "unexpected format of ID (5:), expected connection_type:connection_id"
        );

        let err = import_int("abc", "datastream_type").unwrap_err();
        assert_eq!(
            err.message,
            "could not convert datastream_type (abc) to an integer"
        );
    }

    #[test]
    fn identifier_must_be_present() {
        let state = State::existing(ResourceId::new("adverity_storage", "s"), HashMap::new());
        assert!(identifier(&state).is_err());
        assert_eq!(identifier(&state.with_identifier("7")).unwrap(), "7");
    }
}
