use super::types::{Storage, StorageConfig};
use super::{AdverityClient, AdverityError};

impl AdverityClient {
    pub async fn create_storage(&self, config: &StorageConfig) -> Result<Storage, AdverityError> {
        self.create("storage/", config, "creating storage").await
    }

    pub async fn read_storage(&self, id: &str) -> Result<Storage, AdverityError> {
        self.read(&format!("storage/{}/", id), "reading storage")
            .await
    }

    pub async fn update_storage(
        &self,
        id: &str,
        config: &StorageConfig,
    ) -> Result<(), AdverityError> {
        self.update(&format!("storage/{}/", id), config, "updating storage")
            .await
    }

    pub async fn delete_storage(&self, id: &str) -> Result<(), AdverityError> {
        self.delete(&format!("storage/{}/", id), "deleting storage")
            .await
    }
}
