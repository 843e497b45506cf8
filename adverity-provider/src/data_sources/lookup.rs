//! adverity_lookup data source: resolve human readable terms to lookup ids

use std::collections::HashSet;

use adverity_core::provider::{ProviderError, ProviderResult};
use adverity_core::resource::{Resource, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};
use serde_json::Value as Json;

use crate::client::types::LookupEntry;
use crate::provider::AdverityProvider;
use crate::utils::{Attributes, map_value, string_list};

pub const TYPE: &str = "adverity_lookup";

fn parameter() -> AttributeType {
    AttributeType::Struct {
        name: "LookupParameter".to_string(),
        fields: vec![
            AttributeSchema::new("argument", AttributeType::String).required(),
            AttributeSchema::new("value", AttributeType::String).required(),
        ],
    }
}

fn id_mapping() -> AttributeType {
    AttributeType::Struct {
        name: "IdMapping".to_string(),
        fields: vec![
            AttributeSchema::new("id", AttributeType::String),
            AttributeSchema::new("text", AttributeType::String),
        ],
    }
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .with_description("Looks up ids needed in datastream parameters")
        .attribute(
            AttributeSchema::new("url", AttributeType::String)
                .required()
                .with_description("Lookup endpoint, relative to the instance root"),
        )
        .attribute(AttributeSchema::new(
            "parameters",
            AttributeType::List(Box::new(parameter())),
        ))
        .attribute(
            AttributeSchema::new("expect_string", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description("Whether the endpoint returns string ids"),
        )
        .attribute(
            AttributeSchema::new("match_exact_term", AttributeType::Bool)
                .with_default(Value::Bool(false)),
        )
        .attribute(AttributeSchema::new("search_terms", types::string_list()))
        .attribute(
            AttributeSchema::new("disable_lookup", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description("Skip the lookup, e.g. while the connection is not authorised"),
        )
        .attribute(
            AttributeSchema::new("id_mappings", AttributeType::List(Box::new(id_mapping())))
                .computed(),
        )
        .attribute(AttributeSchema::new("filtered_list", types::string_list()).computed())
}

pub async fn read(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    let mut attributes = resource.attributes.clone();

    let (mappings, filtered) = if a.flag("disable_lookup") {
        (Vec::new(), Vec::new())
    } else {
        let url = a.require_str("url")?;
        let params: Vec<(String, String)> = a
            .blocks("parameters")
            .into_iter()
            .map(|p| (p.string("argument"), p.string("value")))
            .collect();

        let lookup = provider.client().lookup(url, &params).await?;
        if let Some(error) = lookup.error() {
            return Err(ProviderError::new(format!(
                "Error while doing lookup: {}",
                error
            )));
        }
        let mappings: Vec<(String, String)> = lookup.results.iter().map(id_and_text).collect();
        let filtered = filter_ids(
            &mappings,
            &a.strings("search_terms"),
            a.flag("match_exact_term"),
        )?;
        (mappings, filtered)
    };

    attributes.insert(
        "id_mappings".to_string(),
        Value::List(
            mappings
                .into_iter()
                .map(|(id, text)| {
                    map_value([("id", Value::String(id)), ("text", Value::String(text))])
                })
                .collect(),
        ),
    );
    attributes.insert("filtered_list".to_string(), string_list(filtered));
    Ok(State::existing(resource.id.clone(), attributes))
}

fn id_and_text(entry: &LookupEntry) -> (String, String) {
    let id = match &entry.id {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    };
    (id, entry.text.clone())
}

/// Ids of every entry matching a search term, first occurrence order
///
/// An exact match always counts; a case-insensitive substring match counts
/// unless `match_exact` is set. Every term has to match something.
pub fn filter_ids(
    mappings: &[(String, String)],
    terms: &[String],
    match_exact: bool,
) -> ProviderResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for term in terms {
        if term.is_empty() {
            return Err(ProviderError::new(
                "Failed doing lookup: empty string not permitted",
            ));
        }
        let needle = term.to_lowercase();
        let mut matched = false;
        for (id, text) in mappings {
            if text == term || (!match_exact && text.to_lowercase().contains(&needle)) {
                matched = true;
                if seen.insert(id.clone()) {
                    ids.push(id.clone());
                }
            }
        }
        if !matched {
            return Err(ProviderError::new(format!(
                "Error while doing lookup: could not find a match for term \"{}\"",
                term
            )));
        }
    }
    Ok(ids)
}
