//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the desired state declared in the manifest with the current state
//! recorded and refreshed through the Provider, and generates the list of
//! required Effects (Plan).

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// A force-new attribute differs -> needs delete and create
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
    /// Resource exists but not in desired state -> needs deletion
    Delete(State),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State, schema: Option<&ResourceSchema>) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes, schema);

    if changed.is_empty() {
        return Diff::NoChange(desired.id.clone());
    }

    let force_new = schema.is_some_and(|s| changed.iter().any(|name| s.is_force_new(name)));
    if force_new {
        Diff::Replace {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state
///
/// Only attributes declared in the manifest are compared.
pub fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    schema: Option<&ResourceSchema>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        // Skip internal attributes (starting with _)
        if key.starts_with('_') {
            continue;
        }
        if schema.is_some_and(|s| s.is_computed(key)) {
            continue;
        }

        let equal = match (current.get(key), schema) {
            (Some(current_value), Some(s)) => {
                s.normalized(key, desired_value) == s.normalized(key, current_value)
            }
            (Some(current_value), None) => current_value == desired_value,
            (None, _) => false,
        };

        if !equal {
            changed.push(key.clone());
        }
    }

    changed.sort();
    changed
}

/// Compute Diff for multiple resources and generate a Plan
///
/// `desired` must already be in dependency order. `current` is in the order
/// resources were recorded; state entries without a desired counterpart are
/// deleted in reverse of that order, before anything else runs.
pub fn create_plan(
    desired: &[Resource],
    current: &[State],
    schemas: &HashMap<String, ResourceSchema>,
) -> Plan {
    let mut plan = Plan::new();

    let desired_ids: HashSet<&ResourceId> = desired.iter().map(|r| &r.id).collect();
    for state in current.iter().rev() {
        if state.exists && !desired_ids.contains(&state.id) {
            plan.add(Effect::Delete(state.clone()));
        }
    }

    let current_states: HashMap<&ResourceId, &State> =
        current.iter().map(|s| (&s.id, s)).collect();

    for resource in desired {
        if resource.is_data_source() {
            plan.add(Effect::Read(resource.clone()));
            continue;
        }

        let current = current_states
            .get(&resource.id)
            .map(|s| (*s).clone())
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        match diff(resource, &current, schemas.get(&resource.id.resource_type)) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update { id, from, to, .. } => {
                plan.add(Effect::Update { id, from, to });
            }
            Diff::Replace { id, from, to, .. } => {
                plan.add(Effect::Replace { id, from, to });
            }
            Diff::NoChange(_) => {}
            Diff::Delete(state) => plan.add(Effect::Delete(state)),
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, AttributeType};

    fn fetch_schema() -> ResourceSchema {
        ResourceSchema::new("adverity_fetch")
            .attribute(AttributeSchema::new("datastream_id", AttributeType::Int).force_new())
            .attribute(AttributeSchema::new("disable", AttributeType::Bool))
            .attribute(AttributeSchema::new("job_id", AttributeType::Int).computed())
    }

    fn existing(resource_type: &str, name: &str, attrs: &[(&str, Value)]) -> State {
        State::existing(
            ResourceId::new(resource_type, name),
            attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
        .with_identifier("1")
    }

    #[test]
    fn diff_create_when_not_exists() {
        let desired = Resource::new("adverity_storage", "test");
        let current = State::not_found(ResourceId::new("adverity_storage", "test"));

        let result = diff(&desired, &current, None);
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_no_change_when_same() {
        let desired = Resource::new("adverity_storage", "test")
            .with_attribute("url", Value::String("s3://bucket".to_string()));
        let current = existing(
            "adverity_storage",
            "test",
            &[
                ("url", Value::String("s3://bucket".to_string())),
                ("id", Value::Int(1)),
            ],
        );

        let result = diff(&desired, &current, None);
        assert!(matches!(result, Diff::NoChange(_)));
    }

    #[test]
    fn diff_update_when_different() {
        let desired = Resource::new("adverity_fetch", "f")
            .with_attribute("datastream_id", Value::Int(1))
            .with_attribute("disable", Value::Bool(false));
        let current = existing(
            "adverity_fetch",
            "f",
            &[
                ("datastream_id", Value::Int(1)),
                ("disable", Value::Bool(true)),
            ],
        );

        match diff(&desired, &current, Some(&fetch_schema())) {
            Diff::Update {
                changed_attributes, ..
            } => assert_eq!(changed_attributes, vec!["disable".to_string()]),
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn diff_replace_when_force_new_changes() {
        let desired =
            Resource::new("adverity_fetch", "f").with_attribute("datastream_id", Value::Int(2));
        let current = existing("adverity_fetch", "f", &[("datastream_id", Value::Int(1))]);

        assert!(matches!(
            diff(&desired, &current, Some(&fetch_schema())),
            Diff::Replace { .. }
        ));
    }

    #[test]
    fn normalized_values_compare_equal() {
        let schema = ResourceSchema::new("adverity_columns").attribute(
            AttributeSchema::new("schema", AttributeType::String).with_normalize(|v| match v {
                Value::String(s) => Value::String(s.split_whitespace().collect()),
                other => other.clone(),
            }),
        );
        let desired = Resource::new("adverity_columns", "c")
            .with_attribute("schema", Value::String("[ 1, 2 ]".to_string()));
        let current = existing(
            "adverity_columns",
            "c",
            &[("schema", Value::String("[1,2]".to_string()))],
        );

        assert!(matches!(
            diff(&desired, &current, Some(&schema)),
            Diff::NoChange(_)
        ));
    }

    #[test]
    fn create_plan_from_resources() {
        let resources = vec![
            Resource::new("adverity_storage", "new"),
            Resource::new("adverity_storage", "existing")
                .with_attribute("name", Value::String("b".to_string())),
            Resource::new("adverity_workspace", "ws").with_read_only(true),
        ];

        let current = vec![
            existing(
                "adverity_storage",
                "existing",
                &[("name", Value::String("a".to_string()))],
            ),
            existing("adverity_storage", "orphan_a", &[]),
            existing("adverity_storage", "orphan_b", &[]),
        ];

        let plan = create_plan(&resources, &current, &HashMap::new());
        let effects = plan.effects();

        assert_eq!(effects.len(), 5);
        assert!(matches!(&effects[0], Effect::Delete(s) if s.id.name == "orphan_b"));
        assert!(matches!(&effects[1], Effect::Delete(s) if s.id.name == "orphan_a"));
        assert!(matches!(effects[2], Effect::Create(_)));
        assert!(matches!(effects[3], Effect::Update { .. }));
        assert!(matches!(effects[4], Effect::Read(_)));
    }
}
