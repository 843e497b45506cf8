use adverity_core::provider::ProviderError;
use thiserror::Error;

/// Errors returned by [`super::AdverityClient`]
///
/// Messages never include the API token.
#[derive(Debug, Error)]
pub enum AdverityError {
    /// The API answered with a non-2xx status
    #[error("Failed {action}. Got back statuscode: {status} with body: {body}")]
    Api {
        action: String,
        status: u16,
        body: String,
    },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed parsing response while {action}: {message}")]
    Decode { action: String, message: String },

    /// Bad input detected before any request was sent
    #[error("{0}")]
    Invalid(String),
}

impl AdverityError {
    /// Whether the remote object does not exist (HTTP 404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, AdverityError::Api { status: 404, .. })
    }
}

impl From<AdverityError> for ProviderError {
    fn from(err: AdverityError) -> Self {
        ProviderError::new(err.to_string()).with_cause(err)
    }
}
