//! Connection, datastream and destination type searches
//!
//! The three data sources share one schema and one read; only the searched
//! endpoint differs.

use adverity_core::provider::{ProviderError, ProviderResult};
use adverity_core::resource::{Resource, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use log::warn;

use crate::client::TypeKind;
use crate::client::types::TypeEntry;
use crate::provider::AdverityProvider;
use crate::utils::Attributes;

pub const CONNECTION_TYPE: &str = "adverity_connection_type";
pub const DATASTREAM_TYPE: &str = "adverity_datastream_type";
pub const DESTINATION_TYPE: &str = "adverity_destination_type";

/// Searched kind for a data source type name
pub fn kind(type_name: &str) -> Option<TypeKind> {
    match type_name {
        CONNECTION_TYPE => Some(TypeKind::Connection),
        DATASTREAM_TYPE => Some(TypeKind::Datastream),
        DESTINATION_TYPE => Some(TypeKind::Destination),
        _ => None,
    }
}

pub fn schema(type_name: &str) -> ResourceSchema {
    ResourceSchema::new(type_name)
        .with_description("Finds a type id by name")
        .attribute(
            AttributeSchema::new("search_term", AttributeType::String)
                .required()
                .with_description("Name (or part of it) of the type"),
        )
        .attribute(
            AttributeSchema::new("slug_search_term", AttributeType::String)
                .with_description("Slug picking one of several results"),
        )
        .attribute(AttributeSchema::new("type_id", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("type_name", AttributeType::String).computed())
        .attribute(AttributeSchema::new("slug", AttributeType::String).computed())
}

pub async fn read(
    provider: &AdverityProvider,
    kind: TypeKind,
    resource: &Resource,
) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    let search_term = a.require_str("search_term")?;
    let results = provider.client().search_types(kind, search_term).await?;
    let entry = select_type(results, search_term, &a.string("slug_search_term"))?;

    let mut attributes = resource.attributes.clone();
    attributes.insert("type_id".to_string(), Value::Int(entry.id));
    attributes.insert("type_name".to_string(), Value::String(entry.name));
    attributes.insert("slug".to_string(), Value::String(entry.slug));
    Ok(State::existing(resource.id.clone(), attributes))
}

/// Pick one search result; several results are narrowed by slug
pub fn select_type(
    results: Vec<TypeEntry>,
    search_term: &str,
    slug: &str,
) -> ProviderResult<TypeEntry> {
    if results.len() <= 1 {
        return results.into_iter().next().ok_or_else(|| {
            ProviderError::new(format!(
                "No results were found for search term {}",
                search_term
            ))
        });
    }

    let matching: Vec<TypeEntry> = results.into_iter().filter(|r| r.slug == slug).collect();
    if matching.len() > 1 {
        warn!(
            "Multiple results ({}) were found for search term {} and slug search term {}, the first result will be selected ({})",
            matching.len(),
            search_term,
            slug,
            matching[0].name
        );
    }
    matching.into_iter().next().ok_or_else(|| {
        ProviderError::new(format!(
            "No results were found for slug search term {}",
            slug
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, name: &str, slug: &str) -> TypeEntry {
        TypeEntry {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    #[test]
    fn single_result_is_taken_as_is() {
        let picked = select_type(vec![entry(7, "Facebook Ads", "facebook")], "Facebook", "").unwrap();
        assert_eq!(picked.id, 7);
    }

    #[test]
    fn several_results_are_narrowed_by_slug() {
        let results = vec![
            entry(7, "Facebook Ads", "facebook"),
            entry(8, "Facebook Insights", "facebook-insights"),
        ];
        let picked = select_type(results.clone(), "Facebook", "facebook-insights").unwrap();
        assert_eq!(picked.id, 8);

        let err = select_type(results, "Facebook", "meta").unwrap_err();
        assert_eq!(err.message, "No results were found for slug search term meta");
    }

    #[test]
    fn no_results_is_an_error() {
        let err = select_type(Vec::new(), "Nothing", "").unwrap_err();
        assert_eq!(err.message, "No results were found for search term Nothing");
    }

    #[test]
    fn type_names_map_to_kinds() {
        assert_eq!(kind(DATASTREAM_TYPE), Some(TypeKind::Datastream));
        assert_eq!(kind("adverity_lookup"), None);
    }
}
