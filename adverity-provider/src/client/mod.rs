//! HTTP client for the Adverity REST API
//!
//! Every call goes through one of the verb builders below. A non-2xx answer is
//! turned into [`AdverityError::Api`] carrying the status code and raw body.

mod columns;
mod connection;
mod datastream;
mod destination;
mod error;
mod jobs;
mod search;
mod storage;
pub mod types;
mod workspace;

use std::time::Duration;

use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

pub use error::AdverityError;
pub use search::TypeKind;

/// Request timeout used for every call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AdverityClient {
    client: reqwest::Client,
    /// `<instance>/`, used by lookups that address paths outside `/api/`
    root_url: Url,
    /// `<instance>/api/`
    base_url: Url,
}

impl AdverityClient {
    /// Build a client for an instance such as `https://acme.datatap.adverity.com`
    ///
    /// A trailing slash on the instance URL is accepted.
    pub fn new(instance_url: &str, token: &str) -> Result<Self, AdverityError> {
        let root = format!("{}/", instance_url.trim_end_matches('/'));
        let root_url = Url::parse(&root).map_err(|e| {
            AdverityError::Invalid(format!("invalid instance url '{}': {}", instance_url, e))
        })?;
        let base_url = root_url
            .join("api/")
            .map_err(|e| AdverityError::Invalid(e.to_string()))?;

        let mut headers = HeaderMap::new();
        let auth_value = HeaderValue::from_str(&format!("Token {}", token))
            .map_err(|_| AdverityError::Invalid("Invalid token format".to_string()))?;
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(AdverityError::Network)?;

        Ok(Self {
            client,
            root_url,
            base_url,
        })
    }

    pub fn api_base(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, path: &str) -> Result<Url, AdverityError> {
        self.base_url
            .join(path)
            .map_err(|e| AdverityError::Invalid(format!("invalid path '{}': {}", path, e)))
    }

    /// URL relative to the instance root instead of `/api/`
    fn root_relative(&self, path: &str) -> Result<Url, AdverityError> {
        self.root_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| AdverityError::Invalid(format!("invalid path '{}': {}", path, e)))
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
        action: &str,
    ) -> Result<Response, AdverityError> {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.body(body);
        }
        let response = request.send().await?;
        check_status(response, action).await
    }

    /// GET `path`
    pub(crate) async fn read<T: DeserializeOwned>(
        &self,
        path: &str,
        action: &str,
    ) -> Result<T, AdverityError> {
        let response = self.send(Method::GET, self.url(path)?, None, action).await?;
        decode(response, action).await
    }

    /// GET an absolute URL with query pairs appended
    pub(crate) async fn query<T: DeserializeOwned>(
        &self,
        mut url: Url,
        params: &[(String, String)],
        action: &str,
    ) -> Result<T, AdverityError> {
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        let response = self.send(Method::GET, url, None, action).await?;
        decode(response, action).await
    }

    /// POST a JSON body to `path`
    pub(crate) async fn create<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        action: &str,
    ) -> Result<T, AdverityError> {
        let body = encode(body, action)?;
        debug!("Sending body for {}: {}", action, body);
        let response = self
            .send(Method::POST, self.url(path)?, Some(body), action)
            .await?;
        decode(response, action).await
    }

    /// PATCH a JSON body to `path`; the response body is not used
    pub(crate) async fn update<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        action: &str,
    ) -> Result<(), AdverityError> {
        let body = encode(body, action)?;
        debug!("Sending body for {}: {}", action, body);
        self.send(Method::PATCH, self.url(path)?, Some(body), action)
            .await?;
        Ok(())
    }

    /// DELETE `path`
    pub(crate) async fn delete(&self, path: &str, action: &str) -> Result<(), AdverityError> {
        self.send(Method::DELETE, self.url(path)?, None, action)
            .await?;
        Ok(())
    }

    /// OPTIONS `path`
    pub(crate) async fn options<T: DeserializeOwned>(
        &self,
        path: &str,
        action: &str,
    ) -> Result<T, AdverityError> {
        let response = self
            .send(Method::OPTIONS, self.url(path)?, None, action)
            .await?;
        decode(response, action).await
    }
}

async fn check_status(response: Response, action: &str) -> Result<Response, AdverityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AdverityError::Api {
        action: action.to_string(),
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response, action: &str) -> Result<T, AdverityError> {
    let text = response.text().await?;
    // An empty 2xx body decodes like `null` so callers may ask for `Option<_>`
    let text = if text.trim().is_empty() { "null" } else { &text };
    serde_json::from_str(text).map_err(|e| AdverityError::Decode {
        action: action.to_string(),
        message: e.to_string(),
    })
}

fn encode<B: Serialize + ?Sized>(body: &B, action: &str) -> Result<String, AdverityError> {
    serde_json::to_string(body).map_err(|e| AdverityError::Invalid(format!(
        "could not encode body for {}: {}",
        action, e
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn base_url_accepts_trailing_slash() {
        let a = AdverityClient::new("https://acme.adverity.com", "t").unwrap();
        let b = AdverityClient::new("https://acme.adverity.com/", "t").unwrap();
        assert_eq!(a.api_base(), "https://acme.adverity.com/api/");
        assert_eq!(a.api_base(), b.api_base());
    }

    #[test]
    fn invalid_instance_url_is_rejected() {
        assert!(matches!(
            AdverityClient::new("not a url", "t"),
            Err(AdverityError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn read_sends_token_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/stacks/marketing/"))
            .and(header("Authorization", "Token secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4})))
            .mount(&server)
            .await;

        let client = AdverityClient::new(&server.uri(), "secret").unwrap();
        let body: serde_json::Value = client
            .read("stacks/marketing/", "reading workspace")
            .await
            .unwrap();
        assert_eq!(body["id"], 4);
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/storage/3/"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = AdverityClient::new(&server.uri(), "t").unwrap();
        let err = client
            .delete("storage/3/", "deleting storage")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed deleting storage. Got back statuscode: 403 with body: forbidden"
        );
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn query_appends_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/target-types/"))
            .and(query_param("search", "BigQuery"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&server)
            .await;

        let client = AdverityClient::new(&server.uri(), "t").unwrap();
        let url = client.url("target-types/").unwrap();
        let body: serde_json::Value = client
            .query(
                url,
                &[("search".to_string(), "BigQuery".to_string())],
                "searching destination types",
            )
            .await
            .unwrap();
        assert_eq!(body["results"], json!([]));
    }

    #[tokio::test]
    async fn empty_body_decodes_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/datastreams/1/columns/"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = AdverityClient::new(&server.uri(), "t").unwrap();
        let body: Option<serde_json::Value> = client
            .create("datastreams/1/columns/", &json!([]), "creating columns")
            .await
            .unwrap();
        assert!(body.is_none());
    }
}
