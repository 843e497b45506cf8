//! Resolver - Reference resolution and dependency ordering
//!
//! Resources refer to each other with `Value::ResourceRef(binding, attribute)`.
//! The resolver orders resources so that every binding is applied before the
//! resources that reference it, and substitutes references with the values
//! learned from state.

use std::collections::{HashMap, HashSet};

use crate::resource::{Resource, State, Value};

/// binding name -> known attributes
pub type BindingMap = HashMap<String, HashMap<String, Value>>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Dependency cycle detected involving '{0}'")]
    Cycle(String),

    #[error("{resource} references unknown binding '{binding}'")]
    UnknownBinding { resource: String, binding: String },

    #[error("Duplicate binding '{0}'")]
    DuplicateBinding(String),
}

/// Resolve references in a value, leaving unknown ones in place
pub fn resolve_value(value: &Value, bindings: &BindingMap) -> Value {
    match value {
        Value::ResourceRef(binding_name, attr_name) => {
            if let Some(attrs) = bindings.get(binding_name)
                && let Some(attr_value) = attrs.get(attr_name)
            {
                return resolve_value(attr_value, bindings);
            }
            value.clone()
        }
        Value::List(items) => Value::List(items.iter().map(|v| resolve_value(v, bindings)).collect()),
        Value::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_value(v, bindings)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Resolve every attribute of a resource
pub fn resolve_resource(resource: &Resource, bindings: &BindingMap) -> Resource {
    let mut resolved = resource.clone();
    resolved.attributes = resource
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, bindings)))
        .collect();
    resolved
}

/// Record what is known about a binding: declared attributes overlaid by state
pub fn bind(bindings: &mut BindingMap, resource: &Resource, state: Option<&State>) {
    let mut attrs = resource.attributes.clone();
    if let Some(state) = state
        && state.exists
    {
        for (k, v) in &state.attributes {
            attrs.insert(k.clone(), v.clone());
        }
    }
    bindings.insert(resource.binding(), attrs);
}

/// Extract binding names that a resource depends on
pub fn dependencies(resource: &Resource) -> HashSet<String> {
    let mut deps = HashSet::new();
    for value in resource.attributes.values() {
        collect_dependencies(value, &mut deps);
    }
    deps
}

fn collect_dependencies(value: &Value, deps: &mut HashSet<String>) {
    match value {
        Value::ResourceRef(binding_name, _) => {
            deps.insert(binding_name.clone());
        }
        Value::List(items) => {
            for item in items {
                collect_dependencies(item, deps);
            }
        }
        Value::Map(map) => {
            for v in map.values() {
                collect_dependencies(v, deps);
            }
        }
        _ => {}
    }
}

/// Check that bindings are unique and every reference points at a declared binding
pub fn check_references(resources: &[Resource]) -> Result<(), Vec<ResolveError>> {
    let mut errors = Vec::new();
    let mut known = HashSet::new();
    for resource in resources {
        if !known.insert(resource.binding()) {
            errors.push(ResolveError::DuplicateBinding(resource.binding()));
        }
    }
    for resource in resources {
        let mut deps: Vec<_> = dependencies(resource).into_iter().collect();
        deps.sort();
        for dep in deps {
            if !known.contains(&dep) {
                errors.push(ResolveError::UnknownBinding {
                    resource: resource.id.to_string(),
                    binding: dep,
                });
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Sort resources topologically based on dependencies, keeping declaration
/// order among independent resources
pub fn sort_by_dependencies(resources: &[Resource]) -> Result<Vec<Resource>, ResolveError> {
    let binding_to_resource: HashMap<String, &Resource> =
        resources.iter().map(|r| (r.binding(), r)).collect();

    let mut sorted = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut visiting: HashSet<String> = HashSet::new();

    fn visit<'a>(
        resource: &'a Resource,
        binding_to_resource: &HashMap<String, &'a Resource>,
        visited: &mut HashSet<String>,
        visiting: &mut HashSet<String>,
        sorted: &mut Vec<Resource>,
    ) -> Result<(), ResolveError> {
        let binding_name = resource.binding();

        if visited.contains(&binding_name) {
            return Ok(());
        }
        if !visiting.insert(binding_name.clone()) {
            return Err(ResolveError::Cycle(binding_name));
        }

        let mut deps: Vec<_> = dependencies(resource).into_iter().collect();
        deps.sort();
        for dep in deps {
            if let Some(dep_resource) = binding_to_resource.get(&dep) {
                visit(dep_resource, binding_to_resource, visited, visiting, sorted)?;
            }
        }

        visiting.remove(&binding_name);
        visited.insert(binding_name);
        sorted.push(resource.clone());
        Ok(())
    }

    for resource in resources {
        visit(
            resource,
            &binding_to_resource,
            &mut visited,
            &mut visiting,
            &mut sorted,
        )?;
    }

    Ok(sorted)
}
