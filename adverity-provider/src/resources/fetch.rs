//! adverity_fetch: a one-off fetch job of a datastream
//!
//! Fetches are fire-and-record: the job id is kept and its status refreshed on
//! read, but a fetch that already ran is never re-run.

use std::collections::HashMap;

use adverity_core::provider::ProviderResult;
use adverity_core::resource::{Resource, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use log::{info, warn};
use uuid::Uuid;

use crate::client::types::Job;
use crate::fetch_window::{self, FetchMode};
use crate::provider::AdverityProvider;
use crate::utils::Attributes;

pub const TYPE: &str = "adverity_fetch";

/// Keys owned by the provider and carried across updates
const COMPUTED: [&str; 4] = ["job_id", "status", "finished", "is_waiting"];

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .with_description("A fetch job run once for a datastream")
        .attribute(
            AttributeSchema::new("datastream_id", AttributeType::Int)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new(
                "mode",
                AttributeType::Enum(FetchMode::ALL.iter().map(|m| m.to_string()).collect()),
            )
            .with_default(Value::String("days".to_string()))
            .force_new(),
        )
        .attribute(
            AttributeSchema::new("days_to_fetch", fetch_window::days_type())
                .with_default(Value::Int(30))
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("start_date", AttributeType::String)
                .force_new()
                .with_description("First day (YYYY-MM-DD) for the custom mode"),
        )
        .attribute(
            AttributeSchema::new("end_date", AttributeType::String)
                .force_new()
                .with_description("Last day (YYYY-MM-DD) for the custom mode"),
        )
        .attribute(
            AttributeSchema::new("wait_until_completion", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("disable", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description("Record the fetch without running it"),
        )
        .attribute(AttributeSchema::new("job_id", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(AttributeSchema::new("finished", AttributeType::Bool).computed())
        .attribute(AttributeSchema::new("is_waiting", AttributeType::Bool).computed())
}

/// Start a fetch of the window chosen by `mode` and return the job id
///
/// `dates` carries explicit bounds for the custom mode.
pub async fn run(
    provider: &AdverityProvider,
    datastream_id: i64,
    mode: FetchMode,
    days_to_fetch: i64,
    dates: Option<(&str, &str)>,
) -> ProviderResult<i64> {
    let window = match (mode, dates) {
        (FetchMode::Custom, Some((start, end))) => fetch_window::custom(start, end)?,
        _ => mode.window(provider.today(), days_to_fetch)?,
    };
    Ok(provider.client().fetch_fixed(datastream_id, &window).await?)
}

pub async fn create(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    let mut attributes = resource.attributes.clone();
    if a.flag("disable") {
        warn!(
            "[{}] The fetch is disabled, so it will not be executed.",
            resource.id
        );
        attributes.insert("is_waiting".to_string(), Value::Bool(true));
    } else {
        execute(provider, &a, &mut attributes).await?;
    }
    Ok(State::existing(resource.id.clone(), attributes).with_identifier(Uuid::new_v4().to_string()))
}

/// Run the fetch and record the job
async fn execute(
    provider: &AdverityProvider,
    a: &Attributes<'_>,
    attributes: &mut HashMap<String, Value>,
) -> ProviderResult<()> {
    let datastream_id = a.require_int("datastream_id")?;
    let mode: FetchMode = a.str("mode").unwrap_or("days").parse()?;
    let (start, end) = (a.string("start_date"), a.string("end_date"));
    let job_id = run(
        provider,
        datastream_id,
        mode,
        a.int("days_to_fetch").unwrap_or(30),
        Some((start.as_str(), end.as_str())),
    )
    .await?;
    attributes.insert("job_id".to_string(), Value::Int(job_id));

    let job = if a.flag("wait_until_completion") {
        wait_for(provider, job_id).await?
    } else {
        provider.client().read_job(job_id).await?
    };
    info!("Fetch job {} of datastream {}: {}", job_id, datastream_id, job.state_label);
    record_job(attributes, &job);
    attributes.insert("is_waiting".to_string(), Value::Bool(false));
    Ok(())
}

/// Poll the job until it reports an end time
async fn wait_for(provider: &AdverityProvider, job_id: i64) -> ProviderResult<Job> {
    loop {
        let job = provider.client().read_job(job_id).await?;
        if job.is_finished() {
            return Ok(job);
        }
        info!("Waiting for fetch job {} ({})", job_id, job.state_label);
        tokio::time::sleep(provider.poll_interval()).await;
    }
}

fn record_job(attributes: &mut HashMap<String, Value>, job: &Job) {
    attributes.insert("status".to_string(), Value::String(job.state_label.clone()));
    attributes.insert("finished".to_string(), Value::Bool(job.is_finished()));
}

pub async fn read(provider: &AdverityProvider, current: &State) -> ProviderResult<State> {
    if current.identifier.is_none() {
        return Ok(State::not_found(current.id.clone()));
    }
    let Some(job_id) = current.get("job_id").and_then(Value::as_int) else {
        // Waiting fetches have no job yet
        return Ok(current.clone());
    };
    match provider.client().read_job(job_id).await {
        Ok(job) => {
            let mut state = current.clone();
            record_job(&mut state.attributes, &job);
            Ok(state)
        }
        Err(e) if e.is_not_found() => Ok(State::not_found(current.id.clone())),
        Err(e) => Err(e.into()),
    }
}

pub async fn update(provider: &AdverityProvider, from: &State, to: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&to.attributes);
    let mut attributes = to.attributes.clone();
    for key in COMPUTED {
        if let Some(value) = from.get(key) {
            attributes.insert(key.to_string(), value.clone());
        }
    }
    let state = |attributes| {
        let mut state = State::existing(to.id.clone(), attributes);
        state.identifier = from.identifier.clone();
        state
    };

    let waiting = from.get("is_waiting").and_then(Value::as_bool).unwrap_or(false);
    if waiting && !a.flag("disable") {
        execute(provider, &a, &mut attributes).await?;
        return Ok(state(attributes));
    }
    if !waiting {
        warn!(
            "[{}] A fetch that has already been executed cannot be updated.",
            to.id
        );
    }
    read(provider, &state(attributes)).await
}

pub async fn delete(_provider: &AdverityProvider, _current: &State) -> ProviderResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_fields_are_recorded() {
        let mut attributes = HashMap::new();
        let job = Job {
            id: 3,
            state_label: "Done".to_string(),
            job_end: Some("2024-03-01T10:00:00Z".to_string()),
        };
        record_job(&mut attributes, &job);
        assert_eq!(attributes["status"], Value::String("Done".to_string()));
        assert_eq!(attributes["finished"], Value::Bool(true));
    }

    #[test]
    fn schema_defaults() {
        let schema = schema();
        let mut attributes = HashMap::new();
        attributes.insert("datastream_id".to_string(), Value::Int(5));
        schema.apply_defaults(&mut attributes);
        assert_eq!(attributes["mode"], Value::String("days".to_string()));
        assert_eq!(attributes["days_to_fetch"], Value::Int(30));
        assert!(schema.is_force_new("mode"));
        assert!(!schema.is_force_new("disable"));
        assert!(schema.is_computed("job_id"));
    }

    #[test]
    fn oversized_day_counts_fail_validation() {
        let schema = schema();
        let mut attributes = HashMap::new();
        attributes.insert("datastream_id".to_string(), Value::Int(5));
        attributes.insert("days_to_fetch".to_string(), Value::Int(100_000_000));
        schema.apply_defaults(&mut attributes);
        assert!(schema.validate(&attributes).is_err());

        attributes.insert("days_to_fetch".to_string(), Value::Int(90));
        assert!(schema.validate(&attributes).is_ok());
    }
}
