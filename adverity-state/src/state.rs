//! State file structures for persisting infrastructure state

use std::collections::{HashMap, HashSet};

use adverity_core::resource::{ResourceId, State, Value};
use serde::{Deserialize, Serialize};

/// The main state file structure that persists to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Monotonically increasing number for each state modification
    pub serial: u64,
    /// Unique identifier for this state lineage (prevents accidental overwrites)
    pub lineage: String,
    /// Version of the tool that last modified this state
    pub tool_version: String,
    /// All managed resources in the order they were first recorded
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    /// Current state file format version
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new empty state file
    pub fn new() -> Self {
        Self::with_lineage(uuid::Uuid::new_v4().to_string())
    }

    /// Create a new state file with a specific lineage
    pub fn with_lineage(lineage: String) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    /// Increment serial and update the tool version for a new state write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.tool_version = env!("CARGO_PKG_VERSION").to_string();
    }

    /// Find a resource by type and name
    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Find a resource mutably by type and name
    pub fn find_resource_mut(
        &mut self,
        resource_type: &str,
        name: &str,
    ) -> Option<&mut ResourceState> {
        self.resources
            .iter_mut()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Add or update a resource in the state, keeping its position
    pub fn upsert_resource(&mut self, resource: ResourceState) {
        if let Some(existing) = self.find_resource_mut(&resource.resource_type, &resource.name) {
            *existing = resource;
        } else {
            self.resources.push(resource);
        }
    }

    /// Remove a resource from the state
    pub fn remove_resource(&mut self, resource_type: &str, name: &str) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == resource_type && r.name == name)?;
        Some(self.resources.remove(pos))
    }

    /// Record the outcome of an effect: existing states are upserted,
    /// missing ones removed
    pub fn record(&mut self, state: &State, provider: &str) {
        if state.exists {
            let (protected, dependencies) = self
                .find_resource(&state.id.resource_type, &state.id.name)
                .map(|r| (r.protected, r.dependencies.clone()))
                .unwrap_or_default();
            let mut recorded = ResourceState::from_state(state, provider).with_protected(protected);
            recorded.dependencies = dependencies;
            self.upsert_resource(recorded);
        } else {
            self.remove_resource(&state.id.resource_type, &state.id.name);
        }
    }

    /// All recorded resources as core states, dependencies first
    pub fn states(&self) -> Vec<State> {
        self.dependency_order()
            .into_iter()
            .map(ResourceState::to_state)
            .collect()
    }

    /// Resources ordered so each one follows everything it depends on
    ///
    /// Unrelated resources keep their recorded order. Dependencies on bindings
    /// that are not tracked (data sources, deleted resources) are ignored.
    pub fn dependency_order(&self) -> Vec<&ResourceState> {
        let index: HashMap<String, usize> = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.binding(), i))
            .collect();

        fn visit<'a>(
            i: usize,
            resources: &'a [ResourceState],
            index: &HashMap<String, usize>,
            visited: &mut HashSet<usize>,
            order: &mut Vec<&'a ResourceState>,
        ) {
            if !visited.insert(i) {
                return;
            }
            let mut deps: Vec<usize> = resources[i]
                .dependencies
                .iter()
                .filter_map(|d| index.get(d).copied())
                .collect();
            deps.sort();
            for dep in deps {
                visit(dep, resources, index, visited, order);
            }
            order.push(&resources[i]);
        }

        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.resources.len());
        for i in 0..self.resources.len() {
            visit(i, &self.resources, &index, &mut visited, &mut order);
        }
        order
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a single managed resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type (e.g., "adverity_datastream")
    pub resource_type: String,
    /// Resource name (the block name in the manifest)
    pub name: String,
    /// Provider name (e.g., "adverity")
    pub provider: String,
    /// Remote identifier (id, slug or uuid depending on the type)
    #[serde(default)]
    pub identifier: Option<String>,
    /// All attributes of the resource as JSON values
    pub attributes: HashMap<String, serde_json::Value>,
    /// Whether this resource is protected from deletion
    #[serde(default)]
    pub protected: bool,
    /// Bindings (`type.name`) the resource referenced when last applied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl ResourceState {
    /// Create a new resource state
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            identifier: None,
            attributes: HashMap::new(),
            protected: false,
            dependencies: Vec::new(),
        }
    }

    /// Set an attribute value
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Mark this resource as protected
    pub fn with_protected(mut self, protected: bool) -> Self {
        self.protected = protected;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    /// `type.name`, as used in references
    pub fn binding(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    /// Build from a core state
    pub fn from_state(state: &State, provider: &str) -> Self {
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            provider: provider.to_string(),
            identifier: state.identifier.clone(),
            attributes: state
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
            protected: false,
            dependencies: Vec::new(),
        }
    }

    /// Convert to a core state; `null` attributes are dropped
    pub fn to_state(&self) -> State {
        let attributes: HashMap<String, Value> = self
            .attributes
            .iter()
            .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
            .collect();
        State {
            id: self.id(),
            identifier: self.identifier.clone(),
            attributes,
            exists: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_file_new() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_state_file_increment_serial() {
        let mut state = StateFile::new();
        state.increment_serial();
        state.increment_serial();
        assert_eq!(state.serial, 2);
    }

    #[test]
    fn test_state_file_upsert_keeps_position() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("adverity_storage", "a", "adverity"));
        state.upsert_resource(ResourceState::new("adverity_storage", "b", "adverity"));
        state.upsert_resource(
            ResourceState::new("adverity_storage", "a", "adverity")
                .with_attribute("url", serde_json::json!("s3://new")),
        );

        assert_eq!(state.resources.len(), 2);
        assert_eq!(state.resources[0].name, "a");
        assert_eq!(
            state.resources[0].attributes.get("url"),
            Some(&serde_json::json!("s3://new"))
        );
    }

    #[test]
    fn test_state_file_remove_resource() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("adverity_fetch", "f", "adverity"));

        assert!(state.remove_resource("adverity_fetch", "f").is_some());
        assert!(state.remove_resource("adverity_fetch", "other").is_none());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn record_upserts_existing_and_removes_missing() {
        let mut file = StateFile::new();
        let id = ResourceId::new("adverity_workspace", "main");
        let state = State::existing(
            id.clone(),
            [("workspace_id".to_string(), Value::Int(9))]
                .into_iter()
                .collect(),
        )
        .with_identifier("marketing");

        file.record(&state, "adverity");
        let recorded = file.find_resource("adverity_workspace", "main").unwrap();
        assert_eq!(recorded.identifier.as_deref(), Some("marketing"));
        assert_eq!(recorded.attributes["workspace_id"], serde_json::json!(9));

        file.record(&State::not_found(id), "adverity");
        assert!(file.resources.is_empty());
    }

    #[test]
    fn record_keeps_protection() {
        let mut file = StateFile::new();
        file.upsert_resource(
            ResourceState::new("adverity_workspace", "main", "adverity").with_protected(true),
        );
        let state = State::existing(ResourceId::new("adverity_workspace", "main"), HashMap::new());
        file.record(&state, "adverity");
        assert!(file.resources[0].protected);
    }

    #[test]
    fn record_keeps_dependencies() {
        let mut file = StateFile::new();
        file.upsert_resource(
            ResourceState::new("adverity_destination", "bq", "adverity")
                .with_dependencies(vec!["adverity_connection.gcp".to_string()]),
        );
        let state = State::existing(ResourceId::new("adverity_destination", "bq"), HashMap::new());
        file.record(&state, "adverity");
        assert_eq!(file.resources[0].dependencies, vec!["adverity_connection.gcp"]);
    }

    #[test]
    fn dependency_order_puts_referenced_resources_first() {
        let mut file = StateFile::new();
        file.upsert_resource(
            ResourceState::new("adverity_destination", "bq", "adverity")
                .with_dependencies(vec!["adverity_storage.new".to_string()]),
        );
        file.upsert_resource(ResourceState::new("adverity_workspace", "ws", "adverity"));
        file.upsert_resource(ResourceState::new("adverity_storage", "new", "adverity").with_dependencies(
            vec![
                "adverity_workspace.ws".to_string(),
                "data.adverity_workspace.root".to_string(),
            ],
        ));

        let order: Vec<String> = file
            .dependency_order()
            .iter()
            .map(|r| r.binding())
            .collect();
        assert_eq!(
            order,
            vec![
                "adverity_workspace.ws",
                "adverity_storage.new",
                "adverity_destination.bq",
            ]
        );
        let states: Vec<String> = file.states().iter().map(|s| s.id.to_string()).collect();
        assert_eq!(states, order);
    }

    #[test]
    fn converts_to_core_state() {
        let resource = ResourceState::new("adverity_datastream", "ds", "adverity")
            .with_identifier("17")
            .with_attribute("enabled", serde_json::json!(true))
            .with_attribute("description", serde_json::Value::Null);

        let state = resource.to_state();
        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some("17"));
        assert_eq!(state.get("enabled"), Some(&Value::Bool(true)));
        assert!(state.get("description").is_none());
    }

    #[test]
    fn test_state_file_serialization() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("adverity_storage", "s", "adverity")
                .with_identifier("3")
                .with_attribute("url", serde_json::json!("s3://bucket")),
        );

        let json = serde_json::to_string_pretty(&state).unwrap();
        let deserialized: StateFile = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.lineage, state.lineage);
        assert_eq!(deserialized.resources[0].identifier.as_deref(), Some("3"));
    }
}
