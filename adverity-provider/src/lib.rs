//! Adverity Provider
//!
//! Manages Adverity objects (workspaces, connections, datastreams,
//! destinations and their column mappings) through the Adverity REST API.
//!
//! ## Module Structure
//!
//! - `client` - HTTP client and request/response bodies
//! - `resources` - managed resource types
//! - `data_sources` - read-only lookups
//! - `fetch_window`, `schedule`, `reconcile` - date windows, schedule start
//!   times and column reconciliation
//! - `provider` - AdverityProvider and per-type dispatch

pub mod client;
pub mod data_sources;
pub mod fetch_window;
pub mod provider;
pub mod reconcile;
pub mod resources;
pub mod schedule;
pub mod utils;

pub use provider::AdverityProvider;

use adverity_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use adverity_core::resource::{Resource, ResourceId, State};

/// Every managed resource type followed by every data source type
///
/// Needs no credentials, so manifests can be validated offline.
pub fn all_types() -> Vec<Box<dyn ResourceType>> {
    let mut types = resources::resource_types();
    types.extend(data_sources::data_source_types());
    types
}

impl Provider for AdverityProvider {
    fn name(&self) -> &'static str {
        "adverity"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        all_types()
    }

    fn read(&self, current: &State) -> BoxFuture<'_, ProviderResult<State>> {
        let current = current.clone();
        Box::pin(async move { self.read_resource(&current).await })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.read_data(&resource).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&from, &to).await })
    }

    fn delete(&self, current: &State) -> BoxFuture<'_, ProviderResult<()>> {
        let current = current.clone();
        Box::pin(async move { self.delete_resource(&current).await })
    }

    fn import(&self, id: &ResourceId, import_id: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let import_id = import_id.to_string();
        Box::pin(async move { self.import_resource(&id, &import_id).await })
    }
}
