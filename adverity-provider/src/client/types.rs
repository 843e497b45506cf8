//! Request and response bodies of the Adverity API
//!
//! Response types only declare the fields the provider uses; everything else
//! the API returns is ignored. Missing fields fall back to their defaults.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn is_zero(n: &i64) -> bool {
    *n == 0
}

// Workspaces

#[derive(Debug, Clone, Serialize)]
pub struct CreateWorkspace {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub datalake_id: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub parent_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateWorkspace {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub datalake_id: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub parent_id: i64,
    pub stack_slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// URL of the datalake, e.g. `https://x.adverity.com/api/datalakes/3/`
    pub datalake: String,
    pub parent_id: Option<i64>,
}

impl Workspace {
    /// Datalake id parsed out of the datalake URL (second-to-last path segment)
    pub fn datalake_id(&self) -> String {
        let segments: Vec<&str> = self.datalake.split('/').collect();
        if segments.len() < 2 {
            return String::new();
        }
        segments[segments.len() - 2].to_string()
    }
}

// Connections

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Connection {
    pub id: i64,
    pub name: String,
    pub stack: i64,
    pub app: Option<i64>,
    pub user: Option<i64>,
    pub is_authorized: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeUrl {
    pub url: String,
}

/// Answer of `OPTIONS connection-types/{t}/connections/`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    pub actions: HashMap<String, ActionFields>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActionFields {
    pub app: Option<ChoiceField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChoiceField {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub value: i64,
    pub display_name: String,
}

impl ConnectionOptions {
    pub fn app_choices(&self) -> &[Choice] {
        self.actions
            .get("POST")
            .and_then(|a| a.app.as_ref())
            .map(|f| f.choices.as_slice())
            .unwrap_or_default()
    }
}

// Datastreams

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub cron_preset: String,
    pub time_range_preset: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Datastream {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub stack_id: i64,
    pub enabled: bool,
    pub auth: Option<i64>,
    pub datatype: String,
    pub retention_type: Option<i64>,
    pub retention_number: Option<i64>,
    pub overwrite_key_columns: Option<bool>,
    pub overwrite_datastream: Option<bool>,
    pub overwrite_filename: Option<bool>,
    pub is_insights_mediaplan: Option<bool>,
    pub manage_extract_names: Option<bool>,
    pub extract_name_keys: Option<String>,
    pub schedules: Vec<Schedule>,
}

/// Fields shared by every datastream type, sent to `datastreams/{id}/`
#[derive(Debug, Clone, Default, Serialize)]
pub struct DatastreamCommon {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_key_columns: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_datastream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite_filename: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_insights_mediaplan: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manage_extract_names: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_name_keys: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedules: Option<Vec<Schedule>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnableDatastream {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatastreamDatatype {
    pub datatype: String,
}

// Destinations and storage

#[derive(Debug, Clone, Serialize)]
pub struct DestinationConfig {
    pub name: String,
    pub stack: i64,
    pub project: String,
    pub dataset: String,
    pub auth: i64,
    pub schema_mapping: bool,
    pub headers_formatting: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Destination {
    pub id: i64,
    pub name: String,
    pub stack: i64,
    pub auth: i64,
    pub project: String,
    pub dataset: String,
    pub schema_mapping: bool,
    pub headers_formatting: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DestinationMappingConfig {
    pub datastream: i64,
    pub table_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DestinationMapping {
    pub id: i64,
    pub target: Option<i64>,
    pub datastream: i64,
    pub table_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageConfig {
    pub name: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub stack: i64,
    pub url: String,
    pub auth: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub id: i64,
    pub name: String,
    pub stack: i64,
    pub url: String,
    pub auth: i64,
}

// Columns

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Column {
    pub id: i64,
    pub name: String,
    pub datatype: String,
    pub confirmed_type: bool,
    pub target_column: Option<serde_json::Value>,
}

impl Column {
    /// Whether the column is mapped onto a target column
    pub fn is_mapped(&self) -> bool {
        self.target_column.as_ref().is_some_and(|t| !t.is_null())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnDatatype {
    pub datatype: String,
}

/// One page of a paginated list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

// Fetches and jobs

#[derive(Debug, Clone, Serialize)]
pub struct FetchRequest {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FetchResponse {
    pub jobs: Vec<JobRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobRef {
    pub id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Job {
    pub id: i64,
    pub state_label: String,
    pub job_end: Option<String>,
}

impl Job {
    pub fn is_finished(&self) -> bool {
        self.job_end.as_deref().is_some_and(|end| !end.is_empty())
    }
}

// Type searches and lookups

/// A connection, datastream or destination type
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypeEntry {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Answer of a lookup endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Lookup {
    pub error: Option<String>,
    pub results: Vec<LookupEntry>,
}

impl Lookup {
    /// The reported error, if any; `""` and `"nil"` mean success
    pub fn error(&self) -> Option<&str> {
        self.error
            .as_deref()
            .filter(|e| !e.is_empty() && *e != "nil")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupEntry {
    /// Integer or string depending on the endpoint
    pub id: serde_json::Value,
    #[serde(alias = "name")]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn datalake_id_is_second_to_last_segment() {
        let ws = Workspace {
            datalake: "https://acme.adverity.com/api/datalakes/12/".to_string(),
            ..Default::default()
        };
        assert_eq!(ws.datalake_id(), "12");
        assert_eq!(Workspace::default().datalake_id(), "");
    }

    #[test]
    fn workspace_create_omits_empty_fields() {
        let body = CreateWorkspace {
            name: "Marketing".to_string(),
            datalake_id: String::new(),
            parent_id: 0,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({"name": "Marketing"}));
    }

    #[test]
    fn new_column_uses_type_key() {
        let column = NewColumn {
            name: "clicks".to_string(),
            column_type: "Long".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&column).unwrap(),
            json!({"name": "clicks", "type": "Long"})
        );
    }

    #[test]
    fn job_finishes_when_end_is_set() {
        let job: Job = serde_json::from_value(json!({
            "id": 5, "state_label": "Running", "job_end": ""
        }))
        .unwrap();
        assert!(!job.is_finished());

        let job: Job = serde_json::from_value(json!({
            "id": 5, "state_label": "Done", "job_end": "2024-03-01T10:00:00Z"
        }))
        .unwrap();
        assert!(job.is_finished());
    }

    #[test]
    fn lookup_nil_error_is_success() {
        let lookup: Lookup = serde_json::from_value(json!({"error": "nil", "results": []})).unwrap();
        assert_eq!(lookup.error(), None);

        let lookup: Lookup = serde_json::from_value(json!({"error": "expired"})).unwrap();
        assert_eq!(lookup.error(), Some("expired"));
    }

    #[test]
    fn app_choices_come_from_post_action() {
        let options: ConnectionOptions = serde_json::from_value(json!({
            "actions": {"POST": {"app": {"choices": [
                {"value": 3, "display_name": "Default app"}
            ]}}}
        }))
        .unwrap();
        assert_eq!(options.app_choices()[0].value, 3);
        assert!(ConnectionOptions::default().app_choices().is_empty());
    }
}
