//! Interpreter - Execute Effects using a Provider
//!
//! The Interpreter executes Effects contained in a Plan in order,
//! collecting the results. This is where side effects actually occur.

use log::{debug, info};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::provider::{Provider, ProviderError, ProviderResult};
use crate::resolver::{self, BindingMap};
use crate::resource::{Resource, ResourceId, State, Value};

/// Result of executing each Effect
#[derive(Debug)]
pub enum EffectOutcome {
    /// Read succeeded
    Read { state: State },
    /// Create succeeded
    Created { state: State },
    /// Update succeeded
    Updated { state: State },
    /// Delete and re-create succeeded
    Replaced { state: State },
    /// Delete succeeded
    Deleted { id: ResourceId },
    /// Skipped (e.g., dry-run)
    Skipped { reason: String },
}

impl EffectOutcome {
    /// The resulting state, for outcomes that leave a resource behind
    pub fn state(&self) -> Option<&State> {
        match self {
            EffectOutcome::Read { state }
            | EffectOutcome::Created { state }
            | EffectOutcome::Updated { state }
            | EffectOutcome::Replaced { state } => Some(state),
            EffectOutcome::Deleted { .. } | EffectOutcome::Skipped { .. } => None,
        }
    }
}

/// Result of executing the entire Plan
///
/// `outcomes` is index-aligned with the plan's effects; it is shorter than the
/// plan when execution stopped at a failure.
#[derive(Debug)]
pub struct ApplyResult {
    pub outcomes: Vec<Result<EffectOutcome, ProviderError>>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl ApplyResult {
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}

/// Interpreter configuration
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    /// If true, skip actual side effects
    pub dry_run: bool,
    /// Continue on error
    pub continue_on_error: bool,
}

/// Interpreter that executes Effects using a Provider
pub struct Interpreter<P: Provider> {
    provider: P,
    config: InterpreterConfig,
}

impl<P: Provider> Interpreter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Execute a Plan, interpreting all Effects and causing side effects
    ///
    /// `bindings` starts with what is known before the apply (state and data
    /// sources) and is extended with every resource the plan touches, so later
    /// effects see ids produced by earlier ones.
    pub async fn apply(&self, plan: &Plan, bindings: &mut BindingMap) -> ApplyResult {
        let mut outcomes = Vec::new();
        let mut success_count = 0;
        let mut failure_count = 0;

        for effect in plan.effects() {
            let result = self.execute_effect(effect, bindings).await;

            match &result {
                Ok(_) => success_count += 1,
                Err(_) => {
                    failure_count += 1;
                    if !self.config.continue_on_error {
                        outcomes.push(result);
                        break;
                    }
                }
            }

            outcomes.push(result);
        }

        ApplyResult {
            outcomes,
            success_count,
            failure_count,
        }
    }

    /// Execute a single Effect
    async fn execute_effect(
        &self,
        effect: &Effect,
        bindings: &mut BindingMap,
    ) -> ProviderResult<EffectOutcome> {
        if self.config.dry_run {
            return Ok(EffectOutcome::Skipped {
                reason: "dry-run mode".to_string(),
            });
        }

        debug!("Executing {}", effect);

        match effect {
            Effect::Read(resource) => {
                let resolved = resolved_or_err(resource, bindings)?;
                let state = self.provider.read_data_source(&resolved).await?;
                resolver::bind(bindings, &resolved, Some(&state));
                Ok(EffectOutcome::Read { state })
            }
            Effect::Create(resource) => {
                let resolved = resolved_or_err(resource, bindings)?;
                let state = self.provider.create(&resolved).await?;
                info!("Created {} ({})", resource.id, identifier_of(&state));
                resolver::bind(bindings, &resolved, Some(&state));
                Ok(EffectOutcome::Created { state })
            }
            Effect::Update { from, to, .. } => {
                let resolved = resolved_or_err(to, bindings)?;
                let state = self.provider.update(from, &resolved).await?;
                resolver::bind(bindings, &resolved, Some(&state));
                Ok(EffectOutcome::Updated { state })
            }
            Effect::Replace { from, to, .. } => {
                let resolved = resolved_or_err(to, bindings)?;
                self.provider.delete(from).await?;
                let state = self.provider.create(&resolved).await?;
                info!("Replaced {} ({})", to.id, identifier_of(&state));
                resolver::bind(bindings, &resolved, Some(&state));
                Ok(EffectOutcome::Replaced { state })
            }
            Effect::Delete(state) => {
                self.provider.delete(state).await?;
                info!("Deleted {}", state.id);
                Ok(EffectOutcome::Deleted {
                    id: state.id.clone(),
                })
            }
        }
    }
}

fn identifier_of(state: &State) -> &str {
    state.identifier.as_deref().unwrap_or("-")
}

/// Resolve references, failing if any remain (their target was not applied)
fn resolved_or_err(resource: &Resource, bindings: &BindingMap) -> ProviderResult<Resource> {
    let resolved = resolver::resolve_resource(resource, bindings);
    let mut keys: Vec<_> = resolved.attributes.keys().collect();
    keys.sort();
    for key in keys {
        if let Some(value) = resolved.attributes.get(key)
            && value.has_unresolved_ref()
        {
            let reference = match value {
                Value::ResourceRef(b, a) => format!("{}.{}", b, a),
                _ => "nested value".to_string(),
            };
            return Err(ProviderError::new(format!(
                "Attribute '{}' has an unresolved reference ({})",
                key, reference
            ))
            .for_resource(resource.id.clone()));
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{BoxFuture, ResourceType};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TestProvider {
        calls: Mutex<Vec<String>>,
    }

    impl TestProvider {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl Provider for TestProvider {
        fn name(&self) -> &'static str {
            "test"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn read(&self, current: &State) -> BoxFuture<'_, ProviderResult<State>> {
            let state = current.clone();
            Box::pin(async move { Ok(state) })
        }

        fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let mut attrs = resource.attributes.clone();
            attrs.insert("workspace_id".to_string(), Value::Int(77));
            let state = State::existing(resource.id.clone(), attrs);
            Box::pin(async move { Ok(state) })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            self.record(format!("create {}", resource.id));
            if resource.id.name == "broken" {
                return Box::pin(async { Err(ProviderError::new("create failed")) });
            }
            let mut attrs = resource.attributes.clone();
            attrs.insert("id".to_string(), Value::Int(1000));
            let state = State::existing(resource.id.clone(), attrs).with_identifier("1000");
            Box::pin(async move { Ok(state) })
        }

        fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            self.record(format!("update {}", to.id));
            let state = State::existing(to.id.clone(), to.attributes.clone())
                .with_identifier(from.identifier.clone().unwrap_or_default());
            Box::pin(async move { Ok(state) })
        }

        fn delete(&self, current: &State) -> BoxFuture<'_, ProviderResult<()>> {
            self.record(format!("delete {}", current.id));
            Box::pin(async { Ok(()) })
        }

        fn import(&self, id: &ResourceId, import_id: &str) -> BoxFuture<'_, ProviderResult<State>> {
            let state = State::existing(id.clone(), Default::default()).with_identifier(import_id);
            Box::pin(async move { Ok(state) })
        }
    }

    #[tokio::test]
    async fn apply_empty_plan() {
        let interpreter = Interpreter::new(TestProvider::default());
        let plan = Plan::new();
        let result = interpreter.apply(&plan, &mut BindingMap::new()).await;

        assert!(result.is_success());
        assert_eq!(result.success_count, 0);
    }

    #[tokio::test]
    async fn references_flow_between_effects() {
        let interpreter = Interpreter::new(TestProvider::default());
        let mut plan = Plan::new();
        plan.add(Effect::Read(
            Resource::new("adverity_workspace", "ws")
                .with_read_only(true)
                .with_attribute("_binding", Value::String("data.adverity_workspace.ws".into())),
        ));
        plan.add(Effect::Create(Resource::new("adverity_connection", "c").with_attribute(
            "stack",
            Value::ResourceRef("data.adverity_workspace.ws".into(), "workspace_id".into()),
        )));
        plan.add(Effect::Create(Resource::new("adverity_datastream", "d").with_attribute(
            "auth",
            Value::ResourceRef("adverity_connection.c".into(), "id".into()),
        )));

        let mut bindings = BindingMap::new();
        let result = interpreter.apply(&plan, &mut bindings).await;

        assert!(result.is_success());
        let created = result.outcomes[2].as_ref().unwrap().state().unwrap();
        assert_eq!(created.attributes["auth"], Value::Int(1000));
        assert_eq!(
            bindings["adverity_connection.c"]["stack"],
            Value::Int(77)
        );
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let interpreter = Interpreter::new(TestProvider::default());
        let mut plan = Plan::new();
        plan.add(Effect::Create(Resource::new("adverity_storage", "broken")));
        plan.add(Effect::Create(Resource::new("adverity_storage", "ok")));

        let result = interpreter.apply(&plan, &mut BindingMap::new()).await;

        assert!(!result.is_success());
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.failure_count, 1);
    }

    #[tokio::test]
    async fn unresolved_reference_fails_effect() {
        let interpreter = Interpreter::new(TestProvider::default()).with_config(InterpreterConfig {
            continue_on_error: true,
            ..Default::default()
        });
        let mut plan = Plan::new();
        plan.add(Effect::Create(Resource::new("adverity_connection", "c").with_attribute(
            "stack",
            Value::ResourceRef("adverity_workspace.gone".into(), "workspace_id".into()),
        )));
        plan.add(Effect::Create(Resource::new("adverity_storage", "s")));

        let result = interpreter.apply(&plan, &mut BindingMap::new()).await;
        assert_eq!(result.failure_count, 1);
        assert_eq!(result.success_count, 1);
        let err = result.outcomes[0].as_ref().unwrap_err();
        assert!(err.message.contains("unresolved reference"));
    }

    #[tokio::test]
    async fn replace_deletes_then_creates() {
        let interpreter = Interpreter::new(TestProvider::default());
        let id = ResourceId::new("adverity_fetch", "f");
        let mut plan = Plan::new();
        plan.add(Effect::Replace {
            id: id.clone(),
            from: State::existing(id.clone(), Default::default()).with_identifier("old"),
            to: Resource::new("adverity_fetch", "f"),
        });

        let result = interpreter.apply(&plan, &mut BindingMap::new()).await;

        assert!(result.is_success());
        assert!(matches!(
            result.outcomes[0],
            Ok(EffectOutcome::Replaced { .. })
        ));
        let calls = interpreter.provider().calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "delete adverity_fetch.f".to_string(),
                "create adverity_fetch.f".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn dry_run_skips_effects() {
        let config = InterpreterConfig {
            dry_run: true,
            ..Default::default()
        };
        let interpreter = Interpreter::new(TestProvider::default()).with_config(config);
        let mut plan = Plan::new();
        plan.add(Effect::Create(Resource::new("test", "example")));

        let result = interpreter.apply(&plan, &mut BindingMap::new()).await;

        assert!(result.is_success());
        assert!(matches!(
            result.outcomes[0],
            Ok(EffectOutcome::Skipped { .. })
        ));
    }
}
