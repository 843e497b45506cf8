//! Adverity provider implementation
//!
//! Routes each operation to the handler module of the resource or data
//! source type and tags errors with the resource they came from.

use std::time::Duration;

use adverity_core::provider::{ProviderError, ProviderResult};
use adverity_core::resource::{Resource, ResourceId, State};
use chrono::{Local, NaiveDate};

use crate::client::{AdverityClient, AdverityError};
use crate::data_sources::{self, type_search};
use crate::resources::{
    columns, connection, datastream, datatype_mapping, destination, destination_mapping, fetch,
    storage, workspace,
};

/// Default delay between two polls of a job or of a datastream's columns
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AdverityProvider {
    client: AdverityClient,
    poll_interval: Duration,
}

impl AdverityProvider {
    /// Create a provider for an instance such as `https://acme.datatap.adverity.com`
    pub fn new(instance_url: &str, token: &str) -> Result<Self, AdverityError> {
        Ok(Self {
            client: AdverityClient::new(instance_url, token)?,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn client(&self) -> &AdverityClient {
        &self.client
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Local date fetch windows are computed from
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    pub async fn read_resource(&self, current: &State) -> ProviderResult<State> {
        let result = match current.id.resource_type.as_str() {
            workspace::TYPE => workspace::read(self, current).await,
            connection::TYPE => connection::read(self, current).await,
            storage::TYPE => storage::read(self, current).await,
            destination::TYPE => destination::read(self, current).await,
            datastream::TYPE => datastream::read(self, current).await,
            destination_mapping::TYPE => destination_mapping::read(self, current).await,
            columns::TYPE => columns::read(self, current).await,
            datatype_mapping::TYPE => datatype_mapping::read(self, current).await,
            fetch::TYPE => fetch::read(self, current).await,
            other => Err(unknown_type(other)),
        };
        result.map_err(|e| e.for_resource(current.id.clone()))
    }

    pub async fn read_data(&self, resource: &Resource) -> ProviderResult<State> {
        let type_name = resource.id.resource_type.as_str();
        let result = match type_name {
            data_sources::workspace::TYPE => data_sources::workspace::read(self, resource).await,
            data_sources::auth_url::TYPE => data_sources::auth_url::read(self, resource).await,
            data_sources::lookup::TYPE => data_sources::lookup::read(self, resource).await,
            data_sources::connection_app::TYPE => {
                data_sources::connection_app::read(self, resource).await
            }
            other => match type_search::kind(other) {
                Some(kind) => type_search::read(self, kind, resource).await,
                None => Err(ProviderError::new(format!(
                    "Unknown data source type: {}",
                    other
                ))),
            },
        };
        result.map_err(|e| e.for_resource(resource.id.clone()))
    }

    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        let result = match resource.id.resource_type.as_str() {
            workspace::TYPE => workspace::create(self, resource).await,
            connection::TYPE => connection::create(self, resource).await,
            storage::TYPE => storage::create(self, resource).await,
            destination::TYPE => destination::create(self, resource).await,
            datastream::TYPE => datastream::create(self, resource).await,
            destination_mapping::TYPE => destination_mapping::create(self, resource).await,
            columns::TYPE => columns::create(self, resource).await,
            datatype_mapping::TYPE => datatype_mapping::create(self, resource).await,
            fetch::TYPE => fetch::create(self, resource).await,
            other => Err(unknown_type(other)),
        };
        result.map_err(|e| e.for_resource(resource.id.clone()))
    }

    pub async fn update_resource(&self, from: &State, to: &Resource) -> ProviderResult<State> {
        let result = match to.id.resource_type.as_str() {
            workspace::TYPE => workspace::update(self, from, to).await,
            connection::TYPE => connection::update(self, from, to).await,
            storage::TYPE => storage::update(self, from, to).await,
            destination::TYPE => destination::update(self, from, to).await,
            datastream::TYPE => datastream::update(self, from, to).await,
            destination_mapping::TYPE => destination_mapping::update(self, from, to).await,
            columns::TYPE => columns::update(self, from, to).await,
            datatype_mapping::TYPE => datatype_mapping::update(self, from, to).await,
            fetch::TYPE => fetch::update(self, from, to).await,
            other => Err(unknown_type(other)),
        };
        result.map_err(|e| e.for_resource(to.id.clone()))
    }

    pub async fn delete_resource(&self, current: &State) -> ProviderResult<()> {
        let result = match current.id.resource_type.as_str() {
            workspace::TYPE => workspace::delete(self, current).await,
            connection::TYPE => connection::delete(self, current).await,
            storage::TYPE => storage::delete(self, current).await,
            destination::TYPE => destination::delete(self, current).await,
            datastream::TYPE => datastream::delete(self, current).await,
            destination_mapping::TYPE => destination_mapping::delete(self, current).await,
            columns::TYPE => columns::delete(self, current).await,
            datatype_mapping::TYPE => datatype_mapping::delete(self, current).await,
            fetch::TYPE => fetch::delete(self, current).await,
            other => Err(unknown_type(other)),
        };
        result.map_err(|e| e.for_resource(current.id.clone()))
    }

    pub async fn import_resource(&self, id: &ResourceId, import_id: &str) -> ProviderResult<State> {
        let result = match id.resource_type.as_str() {
            workspace::TYPE => workspace::import(self, id, import_id).await,
            connection::TYPE => connection::import(self, id, import_id).await,
            storage::TYPE => storage::import(self, id, import_id).await,
            destination::TYPE => destination::import(self, id, import_id).await,
            datastream::TYPE => datastream::import(self, id, import_id).await,
            destination_mapping::TYPE => destination_mapping::import(self, id, import_id).await,
            columns::TYPE => columns::import(self, id, import_id).await,
            datatype_mapping::TYPE | fetch::TYPE => Err(ProviderError::new(format!(
                "Resource type {} does not support import",
                id.resource_type
            ))),
            other => Err(unknown_type(other)),
        };
        result.map_err(|e| e.for_resource(id.clone()))
    }
}

fn unknown_type(type_name: &str) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", type_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> AdverityProvider {
        AdverityProvider::new("https://acme.datatap.adverity.com/", "secret").unwrap()
    }

    #[test]
    fn poll_interval_is_configurable() {
        let provider = provider();
        assert_eq!(provider.poll_interval(), DEFAULT_POLL_INTERVAL);
        let provider = provider.with_poll_interval(Duration::from_millis(5));
        assert_eq!(provider.poll_interval(), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn unknown_types_are_rejected_with_resource_context() {
        let err = provider()
            .create_resource(&Resource::new("adverity_bucket", "b"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "[adverity_bucket.b] Unknown resource type: adverity_bucket");
    }

    #[tokio::test]
    async fn fetch_cannot_be_imported() {
        let err = provider()
            .import_resource(&ResourceId::new(fetch::TYPE, "daily"), "1")
            .await
            .unwrap_err();
        assert_eq!(
            err.message,
            "Resource type adverity_fetch does not support import"
        );
    }
}
