//! adverity_datastream: a datastream of one datastream type
//!
//! Fields shared by every type go to `datastreams/{id}/`, type specific
//! parameters to `datastream-types/{t}/datastreams/{id}/`.

use std::collections::HashMap;

use adverity_core::provider::{ProviderError, ProviderResult};
use adverity_core::resource::{Resource, ResourceId, State, Value};
use adverity_core::schema::{
    AttributeSchema, AttributeType, ResourceSchema, types, validate_int_range,
    validate_max_length, validate_pattern,
};
use log::{debug, info};
use serde_json::{Map, Value as Json, json};

use super::{fetch, found, imported, must_exist};
use crate::client::types::{Datastream, DatastreamCommon, Schedule};
use crate::fetch_window::{self, FetchMode};
use crate::provider::AdverityProvider;
use crate::schedule::{RandomiseConfig, START_BOUND_PATTERN, randomise_start_times};
use crate::utils::{Attributes, identifier, import_int, map_value, merge_parameters, split_import_id};

pub const TYPE: &str = "adverity_datastream";

fn int_list_param() -> AttributeType {
    AttributeType::Struct {
        name: "IntListParameter".to_string(),
        fields: vec![
            AttributeSchema::new("name", AttributeType::String).required(),
            AttributeSchema::new("values", AttributeType::List(Box::new(AttributeType::Int)))
                .required(),
        ],
    }
}

fn string_list_param() -> AttributeType {
    AttributeType::Struct {
        name: "StringListParameter".to_string(),
        fields: vec![
            AttributeSchema::new("name", AttributeType::String).required(),
            AttributeSchema::new("values", types::string_list()).required(),
        ],
    }
}

fn schedule_block() -> AttributeType {
    AttributeType::Struct {
        name: "Schedule".to_string(),
        fields: vec![
            AttributeSchema::new("cron_preset", AttributeType::String).required(),
            AttributeSchema::new("time_range_preset", AttributeType::Int).required(),
        ],
    }
}

fn start_bound() -> AttributeType {
    AttributeType::Custom {
        name: "StartTime".to_string(),
        base: Box::new(AttributeType::String),
        validate: |v| validate_pattern(v, START_BOUND_PATTERN, "The expected format for start time is hh:mm"),
    }
}

fn randomise_block() -> AttributeType {
    AttributeType::Struct {
        name: "ScheduleRandomiseConfig".to_string(),
        fields: vec![
            AttributeSchema::new("randomise_start_time", AttributeType::Bool)
                .with_default(Value::Bool(false)),
            AttributeSchema::new("min_start", start_bound())
                .with_default(Value::String("00:00".to_string())),
            AttributeSchema::new("max_start", start_bound())
                .with_default(Value::String("23:59".to_string())),
        ],
    }
}

fn fetching_block() -> AttributeType {
    AttributeType::Struct {
        name: "FetchingConfig".to_string(),
        fields: vec![
            AttributeSchema::new("fetch_on_update", AttributeType::Bool)
                .with_default(Value::Bool(false)),
            AttributeSchema::new("days_to_fetch", fetch_window::days_type())
                .with_default(Value::Int(30)),
            AttributeSchema::new(
                "mode",
                AttributeType::Enum(FetchMode::ALL.iter().map(|m| m.to_string()).collect()),
            )
            .with_default(Value::String("days".to_string())),
        ],
    }
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .with_description("A datastream collecting data through a connection")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("stack", AttributeType::Int).required())
        .attribute(
            AttributeSchema::new("auth", AttributeType::Int)
                .required()
                .with_description("ID of the connection used by the datastream"),
        )
        .attribute(AttributeSchema::new("datatype", AttributeType::String).required())
        .attribute(AttributeSchema::new("enabled", AttributeType::Bool).required())
        .attribute(
            AttributeSchema::new("datastream_type_id", AttributeType::Int)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new(
                "description",
                AttributeType::Custom {
                    name: "Description".to_string(),
                    base: Box::new(AttributeType::String),
                    validate: |v| validate_max_length(v, 1000),
                },
            )
            .with_default(Value::String(String::new())),
        )
        .attribute(
            AttributeSchema::new(
                "retention_type",
                AttributeType::Custom {
                    name: "RetentionType".to_string(),
                    base: Box::new(AttributeType::Int),
                    validate: |v| validate_int_range(v, 1, 4),
                },
            )
            .with_default(Value::Int(1)),
        )
        .attribute(AttributeSchema::new(
            "retention_number",
            AttributeType::Custom {
                name: "RetentionNumber".to_string(),
                base: Box::new(AttributeType::Int),
                validate: |v| validate_int_range(v, 0, 32767),
            },
        ))
        .attribute(AttributeSchema::new("overwrite_key_columns", AttributeType::Bool))
        .attribute(AttributeSchema::new("overwrite_datastream", AttributeType::Bool))
        .attribute(AttributeSchema::new("overwrite_filename", AttributeType::Bool))
        .attribute(AttributeSchema::new("is_insights_mediaplan", AttributeType::Bool))
        .attribute(AttributeSchema::new("manage_extract_names", AttributeType::Bool))
        .attribute(AttributeSchema::new(
            "extract_name_keys",
            AttributeType::Custom {
                name: "ExtractNameKeys".to_string(),
                base: Box::new(AttributeType::String),
                validate: |v| validate_max_length(v, 128),
            },
        ))
        .attribute(
            AttributeSchema::new("datastream_parameters", types::string_map())
                .with_description("Type specific string parameters"),
        )
        .attribute(AttributeSchema::new(
            "datastream_list",
            AttributeType::List(Box::new(int_list_param())),
        ))
        .attribute(AttributeSchema::new(
            "datastream_string_list",
            AttributeType::List(Box::new(string_list_param())),
        ))
        .attribute(AttributeSchema::new(
            "schedules",
            AttributeType::List(Box::new(schedule_block())),
        ))
        .attribute(AttributeSchema::new("schedule_randomise_config", randomise_block()))
        .attribute(AttributeSchema::new("fetching_config", fetching_block()))
        .attribute(
            AttributeSchema::new("do_fetch_on_update", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description("Deprecated, use fetching_config"),
        )
        .attribute(
            AttributeSchema::new("days_to_fetch", fetch_window::days_type())
                .with_default(Value::Int(30))
                .with_description("Deprecated, use fetching_config"),
        )
}

/// Schedules with start times drawn when randomising is enabled
fn schedules(a: &Attributes<'_>) -> ProviderResult<Vec<Schedule>> {
    let mut schedules = a
        .blocks("schedules")
        .iter()
        .map(|s| {
            Ok(Schedule {
                cron_preset: s.require_str("cron_preset")?.to_string(),
                time_range_preset: s.require_int("time_range_preset")?,
                start_time: None,
            })
        })
        .collect::<ProviderResult<Vec<_>>>()?;

    if let Some(block) = a.block("schedule_randomise_config") {
        let defaults = RandomiseConfig::default();
        let config = RandomiseConfig {
            randomise_start_time: block.flag("randomise_start_time"),
            min_start: block.str("min_start").unwrap_or(&defaults.min_start).to_string(),
            max_start: block.str("max_start").unwrap_or(&defaults.max_start).to_string(),
        };
        randomise_start_times(&mut schedules, &config, &mut rand::thread_rng())?;
    }
    Ok(schedules)
}

/// Type specific parameters: string map plus int and string lists, all flat
fn specific_parameters(a: &Attributes<'_>) -> Map<String, Json> {
    let mut body = Map::new();
    merge_parameters(&mut body, &a.string_map("datastream_parameters"));
    for param in a.blocks("datastream_list") {
        let values: Vec<i64> = param.list("values").iter().filter_map(Value::as_int).collect();
        body.insert(param.string("name"), json!(values));
    }
    for param in a.blocks("datastream_string_list") {
        body.insert(param.string("name"), json!(param.strings("values")));
    }
    body
}

/// Shared settings; unset optional fields are left out
fn common(a: &Attributes<'_>, schedules: Vec<Schedule>) -> DatastreamCommon {
    DatastreamCommon {
        name: a.str("name").map(str::to_string),
        description: a.str("description").map(str::to_string),
        retention_type: a.int("retention_type"),
        retention_number: a.int("retention_number"),
        overwrite_key_columns: a.bool("overwrite_key_columns"),
        overwrite_datastream: a.bool("overwrite_datastream"),
        overwrite_filename: a.bool("overwrite_filename"),
        is_insights_mediaplan: a.bool("is_insights_mediaplan"),
        manage_extract_names: a.bool("manage_extract_names"),
        extract_name_keys: a.str("extract_name_keys").map(str::to_string),
        schedules: Some(schedules),
    }
}

/// Flat create body; `stack` and `auth` travel as strings
fn create_body(a: &Attributes<'_>) -> ProviderResult<Map<String, Json>> {
    let mut body = match serde_json::to_value(common(a, schedules(a)?)) {
        Ok(Json::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => return Err(ProviderError::new(e.to_string()).with_cause(e)),
    };
    body.insert(
        "name".to_string(),
        Json::String(a.require_str("name")?.to_string()),
    );
    let stack = a.int("stack").unwrap_or(0);
    if stack != 0 {
        body.insert("stack".to_string(), Json::String(stack.to_string()));
    }
    let auth = a.int("auth").unwrap_or(0);
    if auth != 0 {
        body.insert("auth".to_string(), Json::String(auth.to_string()));
    }
    let datatype = a.string("datatype");
    if !datatype.is_empty() {
        body.insert("datatype".to_string(), Json::String(datatype));
    }
    body.extend(specific_parameters(a));
    Ok(body)
}

pub async fn create(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    let type_id = a.require_int("datastream_type_id")?;
    let client = provider.client();

    let created = client.create_datastream(type_id, &create_body(&a)?).await?;
    let id = created.id.to_string();
    info!("Created datastream {} of type {}", id, type_id);

    client.enable_datastream(&id, a.require_bool("enabled")?).await?;

    let state = read_id(provider, &resource.id, type_id, &id, &resource.attributes).await?;
    must_exist(state, "creating datastream")
}

pub async fn read(provider: &AdverityProvider, current: &State) -> ProviderResult<State> {
    let Some(id) = current.identifier.as_deref() else {
        return Ok(State::not_found(current.id.clone()));
    };
    let type_id = Attributes::new(&current.attributes).require_int("datastream_type_id")?;
    read_id(provider, &current.id, type_id, id, &current.attributes).await
}

pub async fn update(provider: &AdverityProvider, from: &State, to: &Resource) -> ProviderResult<State> {
    let id = identifier(from)?;
    let a = Attributes::new(&to.attributes);
    let type_id = a.require_int("datastream_type_id")?;
    let client = provider.client();

    client
        .update_datastream_common(id, &common(&a, schedules(&a)?))
        .await?;
    client
        .set_datastream_datatype(id, &a.string("datatype"))
        .await?;
    let enabled = a.require_bool("enabled")?;
    client.enable_datastream(id, enabled).await?;
    client
        .update_datastream_specific(type_id, id, &specific_parameters(&a))
        .await?;

    if enabled {
        fetch_on_update(provider, &a, id).await?;
    }

    let state = read_id(provider, &to.id, type_id, id, &to.attributes).await?;
    must_exist(state, "updating datastream")
}

/// `fetching_config` wins over the deprecated `do_fetch_on_update` flag
async fn fetch_on_update(provider: &AdverityProvider, a: &Attributes<'_>, id: &str) -> ProviderResult<()> {
    let datastream_id = import_int(id, "datastream_id")?;
    if let Some(config) = a.block("fetching_config") {
        if !config.flag("fetch_on_update") {
            return Ok(());
        }
        let mode: FetchMode = config.str("mode").unwrap_or("days").parse()?;
        let days = config.int("days_to_fetch").unwrap_or(30);
        let job = fetch::run(provider, datastream_id, mode, days, None).await?;
        debug!("Fetch on update of datastream {} started job {}", id, job);
    } else if a.flag("do_fetch_on_update") {
        let days = a.int("days_to_fetch").unwrap_or(30);
        let job = fetch::run(provider, datastream_id, FetchMode::Days, days, None).await?;
        debug!("Fetch on update of datastream {} started job {}", id, job);
    }
    Ok(())
}

pub async fn delete(provider: &AdverityProvider, current: &State) -> ProviderResult<()> {
    let id = identifier(current)?;
    let type_id = Attributes::new(&current.attributes).require_int("datastream_type_id")?;
    provider.client().delete_datastream(type_id, id).await?;
    Ok(())
}

/// Import id format: `datastream_type:datastream_id`
pub async fn import(provider: &AdverityProvider, id: &ResourceId, import_id: &str) -> ProviderResult<State> {
    let parts = split_import_id(import_id, &["datastream_type", "datastream_id"])?;
    let type_id = import_int(parts[0], "datastream_type")?;
    let mut base = HashMap::new();
    base.insert("datastream_type_id".to_string(), Value::Int(type_id));

    let state = read_id(provider, id, type_id, parts[1], &base).await?;
    imported(state, import_id)
}

async fn read_id(
    provider: &AdverityProvider,
    id: &ResourceId,
    type_id: i64,
    datastream_id: &str,
    base: &HashMap<String, Value>,
) -> ProviderResult<State> {
    let read = provider.client().read_datastream(type_id, datastream_id).await;
    match found(read)? {
        Some(datastream) => Ok(to_state(id, base, type_id, &datastream)),
        None => Ok(State::not_found(id.clone())),
    }
}

fn to_state(id: &ResourceId, base: &HashMap<String, Value>, type_id: i64, ds: &Datastream) -> State {
    let mut attributes = base.clone();
    let mut set = |key: &str, value: Value| {
        attributes.insert(key.to_string(), value);
    };

    set("datastream_type_id", Value::Int(type_id));
    set("name", Value::String(ds.name.clone()));
    set("stack", Value::Int(ds.stack_id));
    set("enabled", Value::Bool(ds.enabled));
    set("datatype", Value::String(ds.datatype.clone()));
    if let Some(description) = &ds.description {
        set("description", Value::String(description.clone()));
    }
    if let Some(auth) = ds.auth {
        set("auth", Value::Int(auth));
    }
    if let Some(n) = ds.retention_type {
        set("retention_type", Value::Int(n));
    }
    if let Some(n) = ds.retention_number {
        set("retention_number", Value::Int(n));
    }
    let flags = [
        ("overwrite_key_columns", ds.overwrite_key_columns),
        ("overwrite_datastream", ds.overwrite_datastream),
        ("overwrite_filename", ds.overwrite_filename),
        ("is_insights_mediaplan", ds.is_insights_mediaplan),
        ("manage_extract_names", ds.manage_extract_names),
    ];
    for (key, flag) in flags {
        if let Some(flag) = flag {
            set(key, Value::Bool(flag));
        }
    }
    if let Some(keys) = &ds.extract_name_keys {
        set("extract_name_keys", Value::String(keys.clone()));
    }
    // Start times are drawn at random, so only the presets are compared
    let schedules = ds
        .schedules
        .iter()
        .map(|s| {
            map_value([
                ("cron_preset", Value::String(s.cron_preset.clone())),
                ("time_range_preset", Value::Int(s.time_range_preset)),
            ])
        })
        .collect();
    set("schedules", Value::List(schedules));

    State::existing(id.clone(), attributes).with_identifier(ds.id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource() -> Resource {
        Resource::new(TYPE, "sales")
            .with_attribute("name", Value::String("Sales".to_string()))
            .with_attribute("stack", Value::Int(4))
            .with_attribute("auth", Value::Int(0))
            .with_attribute("datatype", Value::String("Live".to_string()))
            .with_attribute("enabled", Value::Bool(true))
            .with_attribute("datastream_type_id", Value::Int(77))
            .with_attribute(
                "datastream_parameters",
                map_value([("account", Value::String("act_1".to_string()))]),
            )
            .with_attribute(
                "datastream_list",
                Value::List(vec![map_value([
                    ("name", Value::String("metrics".to_string())),
                    ("values", Value::List(vec![Value::Int(1), Value::Int(2)])),
                ])]),
            )
            .with_attribute(
                "schedules",
                Value::List(vec![map_value([
                    ("cron_preset", Value::String("CRON_EVERY_DAY".to_string())),
                    ("time_range_preset", Value::Int(2)),
                ])]),
            )
    }

    #[test]
    fn create_body_is_flat() {
        let r = resource();
        let body = create_body(&Attributes::new(&r.attributes)).unwrap();
        assert_eq!(body["name"], json!("Sales"));
        assert_eq!(body["stack"], json!("4"));
        assert!(!body.contains_key("auth"));
        assert_eq!(body["datatype"], json!("Live"));
        assert_eq!(body["account"], json!("act_1"));
        assert_eq!(body["metrics"], json!([1, 2]));
        assert_eq!(
            body["schedules"],
            json!([{"cron_preset": "CRON_EVERY_DAY", "time_range_preset": 2}])
        );
        assert!(!body.contains_key("description"));
    }

    #[test]
    fn randomised_schedules_get_start_times() {
        let r = resource().with_attribute(
            "schedule_randomise_config",
            map_value([
                ("randomise_start_time", Value::Bool(true)),
                ("min_start", Value::String("03:00".to_string())),
                ("max_start", Value::String("03:00".to_string())),
            ]),
        );
        let schedules = schedules(&Attributes::new(&r.attributes)).unwrap();
        assert_eq!(schedules[0].start_time.as_deref(), Some("03:00:00"));
    }

    #[test]
    fn read_back_drops_start_times() {
        let ds = Datastream {
            id: 9,
            name: "Sales".to_string(),
            stack_id: 4,
            enabled: true,
            schedules: vec![Schedule {
                cron_preset: "CRON_EVERY_DAY".to_string(),
                time_range_preset: 2,
                start_time: Some("03:12:00".to_string()),
            }],
            ..Default::default()
        };
        let state = to_state(&ResourceId::new(TYPE, "sales"), &HashMap::new(), 77, &ds);
        assert_eq!(state.identifier.as_deref(), Some("9"));
        assert_eq!(
            state.get("schedules"),
            Some(&Value::List(vec![map_value([
                ("cron_preset", Value::String("CRON_EVERY_DAY".to_string())),
                ("time_range_preset", Value::Int(2)),
            ])]))
        );
        assert_eq!(state.get("description"), None);
    }
}
