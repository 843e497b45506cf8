//! adverity_connection_app data source: app id of an app-authorised connection type

use adverity_core::provider::{ProviderError, ProviderResult};
use adverity_core::resource::{Resource, State, Value};
use adverity_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::client::types::Choice;
use crate::provider::AdverityProvider;
use crate::utils::Attributes;

pub const TYPE: &str = "adverity_connection_app";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE)
        .with_description("App used to authorise connections of a connection type")
        .attribute(AttributeSchema::new("connection_type_id", AttributeType::Int).required())
        .attribute(
            AttributeSchema::new("app_selector", AttributeType::String)
                .with_description("Display name of the app when several are offered"),
        )
        .attribute(AttributeSchema::new("app_id", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("display_name", AttributeType::String).computed())
}

pub async fn read(provider: &AdverityProvider, resource: &Resource) -> ProviderResult<State> {
    let a = Attributes::new(&resource.attributes);
    let connection_type_id = a.require_int("connection_type_id")?;

    let options = provider
        .client()
        .connection_options(connection_type_id)
        .await?;
    let choice = select_app(options.app_choices(), a.str("app_selector"))?;

    let mut attributes = resource.attributes.clone();
    attributes.insert("app_id".to_string(), Value::Int(choice.value));
    attributes.insert(
        "display_name".to_string(),
        Value::String(choice.display_name.clone()),
    );
    Ok(State::existing(resource.id.clone(), attributes))
}

pub fn select_app<'a>(choices: &'a [Choice], selector: Option<&str>) -> ProviderResult<&'a Choice> {
    match choices {
        [] => Err(ProviderError::new("No app options found for connection type.")),
        [only] => Ok(only),
        _ => choices
            .iter()
            .find(|c| Some(c.display_name.as_str()) == selector)
            .ok_or_else(|| {
                let names: Vec<&str> = choices.iter().map(|c| c.display_name.as_str()).collect();
                ProviderError::new(format!(
                    "Multiple app options found for connection type, none matched the selector (or no selector was given): {}",
                    names.join(", ")
                ))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(value: i64, name: &str) -> Choice {
        Choice {
            value,
            display_name: name.to_string(),
        }
    }

    #[test]
    fn single_choice_ignores_selector() {
        let choices = vec![choice(3, "Default")];
        assert_eq!(select_app(&choices, Some("Other")).unwrap().value, 3);
    }

    #[test]
    fn several_choices_need_a_matching_selector() {
        let choices = vec![choice(3, "Default"), choice(4, "Agency app")];
        assert_eq!(select_app(&choices, Some("Agency app")).unwrap().value, 4);

        let err = select_app(&choices, None).unwrap_err();
        assert_eq!(
            err.message,
            "Multiple app options found for connection type, none matched the selector (or no selector was given): Default, Agency app"
        );
    }

    #[test]
    fn no_choices_is_an_error() {
        let err = select_app(&[], None).unwrap_err();
        assert_eq!(err.message, "No app options found for connection type.");
    }
}
