use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;

use adverity_core::differ::create_plan;
use adverity_core::effect::Effect;
use adverity_core::interpreter::{ApplyResult, EffectOutcome, Interpreter};
use adverity_core::manifest::{DEFAULT_MANIFEST_FILE, Manifest};
use adverity_core::plan::Plan;
use adverity_core::provider::Provider;
use adverity_core::resolver::{self, BindingMap};
use adverity_core::resource::{ResourceId, State, Value};
use adverity_core::schema::SchemaSet;
use adverity_provider::AdverityProvider;
use adverity_state::{BackendConfig, LockInfo, StateBackend, StateFile, create_backend};

mod display;

use display::PlanPrinter;

#[derive(Parser)]
#[command(name = "adverity")]
#[command(about = "Manage Adverity workspaces, connections and datastreams declaratively", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the manifest
    Validate {
        #[arg(default_value = DEFAULT_MANIFEST_FILE)]
        file: PathBuf,
    },
    /// Show the changes apply would make
    Plan {
        #[arg(default_value = DEFAULT_MANIFEST_FILE)]
        file: PathBuf,
    },
    /// Apply the changes
    Apply {
        #[arg(default_value = DEFAULT_MANIFEST_FILE)]
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
    /// Delete every resource tracked in state
    Destroy {
        #[arg(default_value = DEFAULT_MANIFEST_FILE)]
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
    /// Re-read tracked resources and update state
    Refresh {
        #[arg(default_value = DEFAULT_MANIFEST_FILE)]
        file: PathBuf,
    },
    /// Track an existing object in state
    Import {
        file: PathBuf,
        /// Address as `<type>.<name>`
        address: String,
        /// Remote id, e.g. `<connection_type_id>:<connection_id>` for connections
        import_id: String,
    },
    /// Inspect state
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
    /// Release a stuck state lock
    ForceUnlock {
        lock_id: String,
        #[arg(default_value = DEFAULT_MANIFEST_FILE)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum StateCommands {
    /// List tracked resources
    List {
        #[arg(default_value = DEFAULT_MANIFEST_FILE)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Plan { file } => run_plan(&file).await,
        Commands::Apply { file, auto_approve } => run_apply(&file, auto_approve).await,
        Commands::Destroy { file, auto_approve } => run_destroy(&file, auto_approve).await,
        Commands::Refresh { file } => run_refresh(&file).await,
        Commands::Import {
            file,
            address,
            import_id,
        } => run_import(&file, &address, &import_id).await,
        Commands::State {
            command: StateCommands::List { file },
        } => run_state_list(&file).await,
        Commands::ForceUnlock { lock_id, file } => run_force_unlock(&file, &lock_id).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Load a manifest, fill schema defaults and validate every block
fn load_manifest(path: &Path) -> Result<(Manifest, SchemaSet), String> {
    let mut manifest = Manifest::load(path).map_err(|e| e.to_string())?;
    let schemas = SchemaSet::from_types(&adverity_provider::all_types());
    manifest
        .prepare(&schemas)
        .map_err(|errors| format!("Validation failed:\n  {}", errors.join("\n  ")))?;
    Ok((manifest, schemas))
}

fn build_provider(manifest: &Manifest) -> anyhow::Result<AdverityProvider> {
    let (instance_url, token) = manifest.provider.credentials()?;
    AdverityProvider::new(&instance_url, &token)
        .with_context(|| format!("Failed to set up client for {}", instance_url))
}

fn open_backend(manifest: &Manifest) -> anyhow::Result<Box<dyn StateBackend>> {
    create_backend(&BackendConfig::from(&manifest.backend)).context("Failed to open state backend")
}

/// Everything a command needs to talk to the API and the state
struct Session {
    manifest: Manifest,
    schemas: SchemaSet,
    provider: AdverityProvider,
    backend: Box<dyn StateBackend>,
}

impl Session {
    fn open(path: &Path) -> Result<Self, String> {
        let (manifest, schemas) = load_manifest(path)?;
        let provider = build_provider(&manifest).map_err(|e| format!("{:#}", e))?;
        let backend = open_backend(&manifest).map_err(|e| format!("{:#}", e))?;
        Ok(Self {
            manifest,
            schemas,
            provider,
            backend,
        })
    }

    async fn read_state(&self) -> Result<StateFile, String> {
        let state = self.backend.read_state().await.map_err(|e| e.to_string())?;
        Ok(state.unwrap_or_default())
    }

    async fn lock(&self, operation: &str) -> Result<LockInfo, String> {
        self.backend
            .acquire_lock(operation)
            .await
            .map_err(|e| e.to_string())
    }

    /// Release `lock`, reporting the command's own error first
    async fn unlock(&self, lock: &LockInfo, result: Result<(), String>) -> Result<(), String> {
        let released = self
            .backend
            .release_lock(lock)
            .await
            .map_err(|e| format!("Failed to release lock {}: {}", lock.id, e));
        result.and(released)
    }

    async fn save(&self, state: &mut StateFile) -> Result<(), String> {
        state.increment_serial();
        self.backend
            .write_state(state)
            .await
            .map_err(|e| e.to_string())
    }
}

fn run_validate(file: &Path) -> Result<(), String> {
    println!("{}", "Validating...".cyan());

    let (manifest, _) = load_manifest(file)?;
    manifest.ordered().map_err(|e| e.to_string())?;

    println!(
        "{}",
        format!(
            "✓ {} blocks validated successfully.",
            manifest.resources.len()
        )
        .green()
        .bold()
    );
    for resource in &manifest.resources {
        println!("  • {}", resource.binding());
    }
    Ok(())
}

/// Re-read every recorded resource; vanished ones come back with `exists == false`
async fn refresh_states(provider: &AdverityProvider, recorded: &[State]) -> Result<Vec<State>, String> {
    let mut refreshed = Vec::with_capacity(recorded.len());
    for state in recorded {
        let current = provider.read(state).await.map_err(|e| e.to_string())?;
        if !current.exists {
            println!(
                "  {} {} no longer exists and will be dropped from state",
                "!".yellow().bold(),
                state.id
            );
        }
        refreshed.push(current);
    }
    Ok(refreshed)
}

struct Planned {
    plan: Plan,
    bindings: BindingMap,
    refreshed: Vec<State>,
}

/// Refresh state, read data sources whose inputs are known, and diff
async fn build_plan(session: &Session, state: &StateFile) -> Result<Planned, String> {
    let refreshed = refresh_states(&session.provider, &state.states()).await?;
    let current: HashMap<&ResourceId, &State> = refreshed
        .iter()
        .filter(|s| s.exists)
        .map(|s| (&s.id, s))
        .collect();

    let ordered = session.manifest.ordered().map_err(|e| e.to_string())?;
    let mut bindings = BindingMap::new();
    let mut desired = Vec::with_capacity(ordered.len());

    for resource in &ordered {
        let resolved = resolver::resolve_resource(resource, &bindings);
        if resolved.is_data_source() {
            let pending = resolved.attributes.values().any(Value::has_unresolved_ref);
            if pending {
                resolver::bind(&mut bindings, &resolved, None);
            } else {
                let read = session
                    .provider
                    .read_data_source(&resolved)
                    .await
                    .map_err(|e| e.to_string())?;
                resolver::bind(&mut bindings, &resolved, Some(&read));
            }
        } else {
            resolver::bind(&mut bindings, &resolved, current.get(&resolved.id).copied());
        }
        desired.push(resolved);
    }

    let existing: Vec<State> = refreshed.iter().filter(|s| s.exists).cloned().collect();
    let plan = create_plan(&desired, &existing, &session.schemas.resources);

    Ok(Planned {
        plan,
        bindings,
        refreshed,
    })
}

async fn run_plan(file: &Path) -> Result<(), String> {
    let session = Session::open(file)?;
    let state = session.read_state().await?;
    let planned = build_plan(&session, &state).await?;
    PlanPrinter::new(&planned.plan, &session.schemas).print();
    Ok(())
}

/// Ask for `yes` on stdin
fn confirm(question: &str) -> Result<bool, String> {
    println!("{}", question.yellow().bold());
    println!("  {}", "Type 'yes' to confirm.".yellow());
    print!("\n  Enter a value: ");
    std::io::stdout().flush().map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    println!();
    Ok(input.trim() == "yes")
}

/// Print one line per executed effect
fn print_outcomes(plan: &Plan, result: &ApplyResult) {
    for (effect, outcome) in plan.effects().iter().zip(&result.outcomes) {
        match outcome {
            Ok(EffectOutcome::Skipped { reason }) => {
                println!("  {} {} ({})", "-".dimmed(), effect, reason)
            }
            Ok(_) => println!("  {} {}", "✓".green(), effect),
            Err(e) => println!("  {} {} - {}", "✗".red(), effect, e.message),
        }
    }
}

/// Fold successful outcomes into the state file
///
/// Data source reads are not tracked; failed effects leave their entry as is.
fn record_outcomes(state: &mut StateFile, plan: &Plan, result: &ApplyResult, provider: &str) {
    for (effect, outcome) in plan.effects().iter().zip(&result.outcomes) {
        match outcome {
            Ok(EffectOutcome::Deleted { id }) => {
                state.remove_resource(&id.resource_type, &id.name);
            }
            Ok(EffectOutcome::Read { .. }) | Ok(EffectOutcome::Skipped { .. }) => {}
            Ok(outcome) => {
                if let Some(new_state) = outcome.state() {
                    state.record(new_state, provider);
                }
            }
            Err(e) => log::debug!("Not recording {}: {}", effect, e),
        }
    }
}

/// Bindings each managed resource of the manifest references
fn dependency_map(manifest: &Manifest) -> HashMap<String, Vec<String>> {
    manifest
        .managed()
        .map(|r| {
            let mut deps: Vec<String> = resolver::dependencies(r).into_iter().collect();
            deps.sort();
            (r.binding(), deps)
        })
        .collect()
}

/// Store the manifest's references on the tracked entries, for delete ordering
fn record_dependencies(state: &mut StateFile, dependencies: &HashMap<String, Vec<String>>) {
    for resource in &mut state.resources {
        if let Some(deps) = dependencies.get(&resource.binding()) {
            resource.dependencies = deps.clone();
        }
    }
}

fn print_totals(verb: &str, result: &ApplyResult) {
    println!();
    if result.is_success() {
        println!(
            "{}",
            format!("{} complete! {} changes applied.", verb, result.success_count)
                .green()
                .bold()
        );
    } else {
        println!(
            "{}",
            format!(
                "{} failed. {} succeeded, {} failed.",
                verb, result.success_count, result.failure_count
            )
            .red()
            .bold()
        );
    }
}

async fn run_apply(file: &Path, auto_approve: bool) -> Result<(), String> {
    let session = Session::open(file)?;
    let lock = session.lock("apply").await?;
    let result = apply_locked(&session, auto_approve).await;
    session.unlock(&lock, result).await
}

async fn apply_locked(session: &Session, auto_approve: bool) -> Result<(), String> {
    let mut state = session.read_state().await?;
    let Planned {
        plan,
        mut bindings,
        refreshed,
    } = build_plan(session, &state).await?;

    let provider_name = session.provider.name();
    for current in &refreshed {
        state.record(current, provider_name);
    }

    let dependencies = dependency_map(&session.manifest);
    PlanPrinter::new(&plan, &session.schemas).print();
    if plan.has_no_changes() {
        record_dependencies(&mut state, &dependencies);
        return session.save(&mut state).await;
    }
    println!();

    if !auto_approve && !confirm("Do you want to perform these actions?")? {
        println!("{}", "Apply cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Applying changes...".cyan().bold());
    println!();

    let interpreter = Interpreter::new(session.provider.clone());
    let result = interpreter.apply(&plan, &mut bindings).await;
    print_outcomes(&plan, &result);
    record_outcomes(&mut state, &plan, &result, provider_name);
    record_dependencies(&mut state, &dependencies);
    session.save(&mut state).await?;
    print_totals("Apply", &result);

    if result.is_success() {
        Ok(())
    } else {
        Err(format!("{} of {} changes failed", result.failure_count, plan.mutation_count()))
    }
}

async fn run_destroy(file: &Path, auto_approve: bool) -> Result<(), String> {
    let session = Session::open(file)?;
    let lock = session.lock("destroy").await?;
    let result = destroy_locked(&session, auto_approve).await;
    session.unlock(&lock, result).await
}

/// Delete plan for everything in state, dependents before what they
/// reference; protected entries stay
fn destroy_plan(state: &StateFile) -> (Plan, Vec<ResourceId>) {
    let mut plan = Plan::new();
    let mut protected = Vec::new();
    for resource in state.dependency_order().into_iter().rev() {
        if resource.protected {
            protected.push(resource.id());
        } else {
            plan.add(Effect::Delete(resource.to_state()));
        }
    }
    (plan, protected)
}

async fn destroy_locked(session: &Session, auto_approve: bool) -> Result<(), String> {
    let mut state = session.read_state().await?;
    let (plan, protected) = destroy_plan(&state);

    for id in &protected {
        println!("  {} {} is protected and will be kept", "!".yellow().bold(), id);
    }
    if plan.is_empty() {
        println!("{}", "No resources to destroy.".green());
        return Ok(());
    }

    println!("{}", "Destroy Plan:".red().bold());
    println!();
    for effect in plan.effects() {
        println!("  {} {}", "-".red().bold(), effect.resource_id());
    }
    println!();
    println!("Plan: {} to destroy.", plan.effects().len().to_string().red());
    println!();

    if !auto_approve
        && !confirm("Do you really want to destroy all resources? This action cannot be undone.")?
    {
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Destroying resources...".red().bold());
    println!();

    let interpreter = Interpreter::new(session.provider.clone());
    let mut bindings = BindingMap::new();
    let result = interpreter.apply(&plan, &mut bindings).await;
    print_outcomes(&plan, &result);
    record_outcomes(&mut state, &plan, &result, session.provider.name());
    session.save(&mut state).await?;
    print_totals("Destroy", &result);

    if result.is_success() {
        Ok(())
    } else {
        Err(format!("{} of {} deletions failed", result.failure_count, plan.effects().len()))
    }
}

async fn run_refresh(file: &Path) -> Result<(), String> {
    let session = Session::open(file)?;
    let lock = session.lock("refresh").await?;
    let result = refresh_locked(&session).await;
    session.unlock(&lock, result).await
}

async fn refresh_locked(session: &Session) -> Result<(), String> {
    let mut state = session.read_state().await?;
    let refreshed = refresh_states(&session.provider, &state.states()).await?;
    for current in &refreshed {
        state.record(current, session.provider.name());
    }
    session.save(&mut state).await?;

    println!(
        "{}",
        format!("✓ Refreshed {} resources.", state.resources.len())
            .green()
            .bold()
    );
    Ok(())
}

/// Split `<type>.<name>`
fn parse_address(address: &str) -> Result<ResourceId, String> {
    match address.split_once('.') {
        Some((resource_type, name)) if !resource_type.is_empty() && !name.is_empty() => {
            Ok(ResourceId::new(resource_type, name))
        }
        _ => Err(format!(
            "Invalid address '{}': expected <type>.<name>",
            address
        )),
    }
}

async fn run_import(file: &Path, address: &str, import_id: &str) -> Result<(), String> {
    let id = parse_address(address)?;
    let session = Session::open(file)?;
    if !session.schemas.resources.contains_key(&id.resource_type) {
        return Err(format!("Unknown resource type: {}", id.resource_type));
    }

    let lock = session.lock("import").await?;
    let result = import_locked(&session, &id, import_id).await;
    session.unlock(&lock, result).await
}

async fn import_locked(session: &Session, id: &ResourceId, import_id: &str) -> Result<(), String> {
    let mut state = session.read_state().await?;
    if state.find_resource(&id.resource_type, &id.name).is_some() {
        return Err(format!("{} is already tracked in state", id));
    }

    let imported = session
        .provider
        .import(id, import_id)
        .await
        .map_err(|e| e.to_string())?;
    state.record(&imported, session.provider.name());
    record_dependencies(&mut state, &dependency_map(&session.manifest));
    session.save(&mut state).await?;

    println!(
        "{}",
        format!(
            "✓ Imported {} ({})",
            id,
            imported.identifier.as_deref().unwrap_or(import_id)
        )
        .green()
        .bold()
    );
    Ok(())
}

async fn run_state_list(file: &Path) -> Result<(), String> {
    let manifest = Manifest::load(file).map_err(|e| e.to_string())?;
    let backend = open_backend(&manifest).map_err(|e| format!("{:#}", e))?;
    let Some(state) = backend.read_state().await.map_err(|e| e.to_string())? else {
        println!("{}", format!("No state at {}.", backend.location()).yellow());
        return Ok(());
    };

    for line in state_lines(&state) {
        println!("{}", line);
    }
    Ok(())
}

/// `type.name (identifier)` per tracked resource, flagged when protected
fn state_lines(state: &StateFile) -> Vec<String> {
    state
        .resources
        .iter()
        .map(|r| {
            let mut line = format!("{}.{}", r.resource_type, r.name);
            if let Some(identifier) = &r.identifier {
                line.push_str(&format!(" ({})", identifier));
            }
            if r.protected {
                line.push_str(" [protected]");
            }
            line
        })
        .collect()
}

async fn run_force_unlock(file: &Path, lock_id: &str) -> Result<(), String> {
    let manifest = Manifest::load(file).map_err(|e| e.to_string())?;
    let backend = open_backend(&manifest).map_err(|e| format!("{:#}", e))?;
    backend
        .force_unlock(lock_id)
        .await
        .map_err(|e| e.to_string())?;
    println!("{}", format!("✓ Lock {} released.", lock_id).green().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adverity_core::provider::ProviderError;
    use adverity_state::ResourceState;

    fn tracked(resource_type: &str, name: &str) -> ResourceState {
        ResourceState::new(resource_type, name, "adverity").with_identifier("1")
    }

    #[test]
    fn addresses_need_type_and_name() {
        let id = parse_address("adverity_connection.facebook").unwrap();
        assert_eq!(id, ResourceId::new("adverity_connection", "facebook"));
        assert!(parse_address("adverity_connection").is_err());
        assert!(parse_address(".facebook").is_err());
    }

    #[test]
    fn destroy_runs_newest_first_and_keeps_protected() {
        let mut state = StateFile::new();
        state.upsert_resource(tracked("adverity_workspace", "ws"));
        state.upsert_resource(tracked("adverity_connection", "fb").with_protected(true));
        state.upsert_resource(tracked("adverity_datastream", "ds"));

        let (plan, protected) = destroy_plan(&state);
        let order: Vec<String> = plan
            .effects()
            .iter()
            .map(|e| e.resource_id().to_string())
            .collect();
        assert_eq!(order, vec!["adverity_datastream.ds", "adverity_workspace.ws"]);
        assert_eq!(protected, vec![ResourceId::new("adverity_connection", "fb")]);
    }

    #[test]
    fn destroy_follows_dependencies_over_recorded_order() {
        let mut state = StateFile::new();
        state.upsert_resource(
            tracked("adverity_destination", "bq")
                .with_dependencies(vec!["adverity_storage.new".to_string()]),
        );
        state.upsert_resource(tracked("adverity_storage", "new"));

        let (plan, _) = destroy_plan(&state);
        let order: Vec<String> = plan
            .effects()
            .iter()
            .map(|e| e.resource_id().to_string())
            .collect();
        assert_eq!(order, vec!["adverity_destination.bq", "adverity_storage.new"]);
    }

    #[test]
    fn manifest_references_are_recorded_as_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adverity.toml");
        std::fs::write(
            &path,
            r#"
[resource.adverity_workspace.sales]
name = "Sales"

[resource.adverity_storage.lake]
name = "lake"
stack = "${adverity_workspace.sales.workspace_id}"
url = "s3://bucket"
auth = 4
"#,
        )
        .unwrap();
        let manifest = Manifest::load(&path).unwrap();

        let mut state = StateFile::new();
        state.upsert_resource(tracked("adverity_storage", "lake"));
        state.upsert_resource(tracked("adverity_workspace", "sales"));
        record_dependencies(&mut state, &dependency_map(&manifest));

        assert_eq!(state.resources[0].dependencies, vec!["adverity_workspace.sales"]);
        assert!(state.resources[1].dependencies.is_empty());
        let (plan, _) = destroy_plan(&state);
        assert_eq!(
            plan.effects()[0].resource_id(),
            &ResourceId::new("adverity_storage", "lake")
        );
    }

    #[test]
    fn outcomes_update_state_up_to_the_failure() {
        let mut state = StateFile::new();
        state.upsert_resource(tracked("adverity_storage", "old"));

        let mut plan = Plan::new();
        let old = ResourceState::new("adverity_storage", "old", "adverity").to_state();
        plan.add(Effect::Delete(old));
        let created = adverity_core::resource::Resource::new("adverity_workspace", "ws");
        plan.add(Effect::Create(created));
        let failed = adverity_core::resource::Resource::new("adverity_destination", "bq");
        plan.add(Effect::Create(failed));

        let ws_id = ResourceId::new("adverity_workspace", "ws");
        let result = ApplyResult {
            outcomes: vec![
                Ok(EffectOutcome::Deleted {
                    id: ResourceId::new("adverity_storage", "old"),
                }),
                Ok(EffectOutcome::Created {
                    state: State::existing(ws_id, HashMap::new()).with_identifier("sales"),
                }),
                Err(ProviderError::new("boom")),
            ],
            success_count: 2,
            failure_count: 1,
        };

        record_outcomes(&mut state, &plan, &result, "adverity");
        let names: Vec<&str> = state.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ws"]);
        assert_eq!(state.resources[0].identifier.as_deref(), Some("sales"));
    }

    #[test]
    fn state_lines_show_identifier_and_protection() {
        let mut state = StateFile::new();
        state.upsert_resource(tracked("adverity_workspace", "ws").with_protected(true));
        state.upsert_resource(ResourceState::new("adverity_fetch", "f", "adverity"));
        assert_eq!(
            state_lines(&state),
            vec![
                "adverity_workspace.ws (1) [protected]".to_string(),
                "adverity_fetch.f".to_string(),
            ]
        );
    }

    #[test]
    fn manifest_errors_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adverity.toml");
        std::fs::write(
            &path,
            r#"
[resource.adverity_workspace.sales]
name = "Sales"
colour = "red"

[resource.adverity_bogus.x]
name = "x"
"#,
        )
        .unwrap();

        let err = load_manifest(&path).err().unwrap();
        assert!(err.starts_with("Validation failed:"), "{}", err);
        assert!(err.contains("unknown resource type 'adverity_bogus'"), "{}", err);
        assert!(err.contains("colour"), "{}", err);
    }

    #[test]
    fn valid_manifest_loads_offline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adverity.toml");
        std::fs::write(
            &path,
            r#"
[data.adverity_workspace.parent]
slug = "root"

[resource.adverity_workspace.sales]
name = "Sales"
parent_id = "${data.adverity_workspace.parent.workspace_id}"
"#,
        )
        .unwrap();

        let (manifest, schemas) = load_manifest(&path).unwrap();
        let ordered = manifest.ordered().unwrap();
        assert_eq!(ordered[0].binding(), "data.adverity_workspace.parent");
        assert!(schemas.resources.contains_key("adverity_workspace"));
    }
}
