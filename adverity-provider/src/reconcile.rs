//! Column reconciliation between a desired table schema and datastream columns
//!
//! The desired schema uses warehouse type names (`STRING`, `INTEGER`, ...), the
//! API uses Adverity datatypes (`String`, `Long`, ...).

use adverity_core::provider::ProviderError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::types::Column;

/// Desired type name to Adverity datatype
const TYPE_MAP: [(&str, &str); 7] = [
    ("STRING", "String"),
    ("INTEGER", "Long"),
    ("FLOAT", "Float"),
    ("DATE", "Date"),
    ("DATETIME", "DateTime"),
    ("BOOLEAN", "Boolean"),
    ("JSON", "JSON"),
];

/// Characters replaced by `_` when sanitising column names
const SPECIAL_CHARACTERS: [char; 7] = ['(', ')', '%', '-', ' ', '.', ':'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
    #[error("Unsupported type '{column_type}' for column '{name}'")]
    UnsupportedType { name: String, column_type: String },
}

impl From<ReconcileError> for ProviderError {
    fn from(err: ReconcileError) -> Self {
        ProviderError::new(err.to_string()).with_cause(err)
    }
}

pub fn to_adverity_type(desired: &str) -> Option<&'static str> {
    TYPE_MAP
        .iter()
        .find(|(d, _)| *d == desired)
        .map(|(_, a)| *a)
}

pub fn from_adverity_type(adverity: &str) -> Option<&'static str> {
    TYPE_MAP
        .iter()
        .find(|(_, a)| *a == adverity)
        .map(|(d, _)| *d)
}

/// One entry of a desired schema; `mode` and any other key is dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl SchemaColumn {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }

    /// Adverity datatype for this column
    pub fn adverity_type(&self) -> Result<&'static str, ReconcileError> {
        to_adverity_type(&self.column_type).ok_or_else(|| ReconcileError::UnsupportedType {
            name: self.name.clone(),
            column_type: self.column_type.clone(),
        })
    }
}

/// A column as read back from the API, in desired-schema terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    /// Present only for columns that came from the API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapped: Option<bool>,
}

pub fn parse_schema(json: &str) -> Result<Vec<SchemaColumn>, ReconcileError> {
    serde_json::from_str(json).map_err(|e| ReconcileError::InvalidSchema(e.to_string()))
}

/// Compact `[{"name":..,"type":..}]` form of a schema document
///
/// Returns `None` when the document is not a list of columns.
pub fn normalize_schema(json: &str) -> Option<String> {
    let columns = parse_schema(json).ok()?;
    serde_json::to_string(&columns).ok()
}

/// Replace special characters with `_` and prefix names starting with a digit
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if SPECIAL_CHARACTERS.contains(&c) { '_' } else { c })
        .collect();
    match replaced.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("n{}", replaced),
        _ => replaced,
    }
}

/// A datatype change to send for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPatch {
    pub id: i64,
    pub name: String,
    pub from: String,
    pub to: &'static str,
}

/// Outcome of comparing a desired schema with the API's columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub patches: Vec<ColumnPatch>,
    /// Desired columns the API does not have
    pub missing_in_api: Vec<String>,
    /// API columns the schema does not mention
    pub missing_in_schema: Vec<String>,
}

impl Reconciliation {
    /// Human readable reports of both unmatched sets
    pub fn mismatch_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        if !self.missing_in_api.is_empty() {
            messages.push(format!(
                "Could not find references in Adverity API for following columns specified in the schema: {}",
                self.missing_in_api.join(", ")
            ));
        }
        if !self.missing_in_schema.is_empty() {
            messages.push(format!(
                "Found references in Adverity API which are not present in the specified schema: {}",
                self.missing_in_schema.join(", ")
            ));
        }
        messages
    }
}

/// Compare the desired schema with the API's columns
///
/// A matched column needs a patch when its type is unconfirmed or differs from
/// the mapped desired type. Ignored columns are left out of both reports.
pub fn reconcile(
    desired: &[SchemaColumn],
    api: &[Column],
    ignored: &[String],
) -> Result<Reconciliation, ReconcileError> {
    let is_ignored = |name: &str| ignored.iter().any(|i| i == name);
    let mut remaining: Vec<&SchemaColumn> = desired.iter().collect();
    let mut result = Reconciliation::default();

    for column in api {
        match remaining.iter().position(|d| d.name == column.name) {
            Some(idx) => {
                let target = remaining.remove(idx).adverity_type()?;
                if !column.confirmed_type || column.datatype != target {
                    result.patches.push(ColumnPatch {
                        id: column.id,
                        name: column.name.clone(),
                        from: column.datatype.clone(),
                        to: target,
                    });
                }
            }
            None if is_ignored(&column.name) => {}
            None => result.missing_in_schema.push(column.name.clone()),
        }
    }

    result.missing_in_api = remaining
        .into_iter()
        .filter(|d| !is_ignored(&d.name))
        .map(|d| d.name.clone())
        .collect();

    Ok(result)
}

/// Schema as seen through the API, shaped like the desired one
///
/// Matched columns follow the desired order with the API's type; unmatched
/// desired columns survive only when ignored; leftover API columns go last.
pub fn merge_columns(desired: &[SchemaColumn], api: &[Column], ignored: &[String]) -> Vec<ReadColumn> {
    let mut remaining: Vec<&Column> = api.iter().collect();
    let mut merged = Vec::new();

    for column in desired {
        if let Some(idx) = remaining.iter().position(|c| c.name == column.name) {
            merged.push(read_column(remaining.remove(idx)));
        } else if ignored.iter().any(|i| *i == column.name) {
            merged.push(ReadColumn {
                name: column.name.clone(),
                column_type: column.column_type.clone(),
                mapped: None,
            });
        }
    }

    merged.extend(remaining.into_iter().map(read_column));
    merged
}

fn read_column(column: &Column) -> ReadColumn {
    ReadColumn {
        name: column.name.clone(),
        column_type: from_adverity_type(&column.datatype)
            .unwrap_or_default()
            .to_string(),
        mapped: Some(column.is_mapped()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_column(id: i64, name: &str, datatype: &str, confirmed: bool) -> Column {
        Column {
            id,
            name: name.to_string(),
            datatype: datatype.to_string(),
            confirmed_type: confirmed,
            target_column: None,
        }
    }

    #[test]
    fn type_map_round_trips() {
        for (desired, adverity) in TYPE_MAP {
            assert_eq!(to_adverity_type(desired), Some(adverity));
            assert_eq!(from_adverity_type(adverity), Some(desired));
        }
        assert_eq!(to_adverity_type("NUMERIC"), None);
    }

    #[test]
    fn normalize_drops_mode_and_whitespace() {
        let schema = r#"[
            {"name": "date", "type": "DATE", "mode": "NULLABLE"},
            {"type": "INTEGER", "name": "clicks"}
        ]"#;
        assert_eq!(
            normalize_schema(schema).unwrap(),
            r#"[{"name":"date","type":"DATE"},{"name":"clicks","type":"INTEGER"}]"#
        );
        assert_eq!(normalize_schema("{\"name\": 1}"), None);
    }

    #[test]
    fn sanitize_replaces_special_characters() {
        assert_eq!(sanitize_name("Cost (EUR)"), "Cost__EUR_");
        assert_eq!(sanitize_name("ctr-%.rate:x"), "ctr___rate_x");
        assert_eq!(sanitize_name("1st day"), "n1st_day");
        assert_eq!(sanitize_name("plain"), "plain");
    }

    #[test]
    fn reconcile_patches_unconfirmed_and_mismatched_types() {
        let desired = vec![
            SchemaColumn::new("date", "DATE"),
            SchemaColumn::new("clicks", "INTEGER"),
            SchemaColumn::new("cost", "FLOAT"),
        ];
        let api = vec![
            api_column(1, "date", "Date", true),
            api_column(2, "clicks", "String", true),
            api_column(3, "cost", "Float", false),
        ];

        let result = reconcile(&desired, &api, &[]).unwrap();
        let patched: Vec<(i64, &str)> = result.patches.iter().map(|p| (p.id, p.to)).collect();
        assert_eq!(patched, vec![(2, "Long"), (3, "Float")]);
        assert!(result.mismatch_messages().is_empty());
    }

    #[test]
    fn reconcile_reports_unmatched_columns_except_ignored() {
        let desired = vec![
            SchemaColumn::new("date", "DATE"),
            SchemaColumn::new("revenue", "FLOAT"),
            SchemaColumn::new("notes", "STRING"),
        ];
        let api = vec![
            api_column(1, "date", "Date", true),
            api_column(2, "impressions", "Long", true),
            api_column(3, "raw", "String", true),
        ];
        let ignored = vec!["notes".to_string(), "raw".to_string()];

        let result = reconcile(&desired, &api, &ignored).unwrap();
        assert_eq!(result.missing_in_api, vec!["revenue"]);
        assert_eq!(result.missing_in_schema, vec!["impressions"]);
        assert_eq!(
            result.mismatch_messages(),
            vec![
                "Could not find references in Adverity API for following columns specified in the schema: revenue".to_string(),
                "Found references in Adverity API which are not present in the specified schema: impressions".to_string(),
            ]
        );
    }

    #[test]
    fn reconcile_rejects_unknown_desired_type() {
        let desired = vec![SchemaColumn::new("clicks", "NUMERIC")];
        let api = vec![api_column(1, "clicks", "Long", true)];
        assert!(matches!(
            reconcile(&desired, &api, &[]),
            Err(ReconcileError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn merge_keeps_desired_order_then_leftovers() {
        let desired = vec![
            SchemaColumn::new("clicks", "INTEGER"),
            SchemaColumn::new("date", "DATE"),
            SchemaColumn::new("gone", "STRING"),
            SchemaColumn::new("skipped", "STRING"),
        ];
        let mut mapped = api_column(2, "clicks", "Long", true);
        mapped.target_column = Some(json!(17));
        let api = vec![
            api_column(1, "date", "Date", true),
            mapped,
            api_column(3, "extra", "Boolean", true),
        ];

        let merged = merge_columns(&desired, &api, &["skipped".to_string()]);
        let names: Vec<&str> = merged.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["clicks", "date", "skipped", "extra"]);
        assert_eq!(merged[0].mapped, Some(true));
        assert_eq!(merged[1].mapped, Some(false));
        assert_eq!(merged[2].mapped, None);
        assert_eq!(merged[3].column_type, "BOOLEAN");

        let json = serde_json::to_string(&merged[2]).unwrap();
        assert_eq!(json, r#"{"name":"skipped","type":"STRING"}"#);
    }
}
