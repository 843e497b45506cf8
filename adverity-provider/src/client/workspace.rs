use super::types::{CreateWorkspace, UpdateWorkspace, Workspace};
use super::{AdverityClient, AdverityError};

impl AdverityClient {
    pub async fn create_workspace(
        &self,
        config: &CreateWorkspace,
    ) -> Result<Workspace, AdverityError> {
        self.create("stacks/", config, "creating workspace").await
    }

    pub async fn read_workspace(&self, slug: &str) -> Result<Workspace, AdverityError> {
        self.read(&format!("stacks/{}/", slug), "reading workspace")
            .await
    }

    pub async fn update_workspace(
        &self,
        slug: &str,
        config: &UpdateWorkspace,
    ) -> Result<(), AdverityError> {
        self.update(&format!("stacks/{}/", slug), config, "updating workspace")
            .await
    }

    pub async fn delete_workspace(&self, slug: &str) -> Result<(), AdverityError> {
        self.delete(&format!("stacks/{}/", slug), "deleting workspace")
            .await
    }
}
