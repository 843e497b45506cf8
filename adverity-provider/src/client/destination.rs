use super::types::{
    Destination, DestinationConfig, DestinationMapping, DestinationMappingConfig,
};
use super::{AdverityClient, AdverityError};

fn destination_path(destination_type: i64, id: &str) -> String {
    format!("target-types/{}/targets/{}/", destination_type, id)
}

fn mappings_path(destination_type: i64, destination_id: &str) -> String {
    format!("{}mappings/", destination_path(destination_type, destination_id))
}

impl AdverityClient {
    pub async fn create_destination(
        &self,
        destination_type: i64,
        config: &DestinationConfig,
    ) -> Result<Destination, AdverityError> {
        self.create(
            &format!("target-types/{}/targets/", destination_type),
            config,
            "creating destination",
        )
        .await
    }

    pub async fn read_destination(
        &self,
        destination_type: i64,
        id: &str,
    ) -> Result<Destination, AdverityError> {
        self.read(
            &destination_path(destination_type, id),
            "reading destination",
        )
        .await
    }

    pub async fn update_destination(
        &self,
        destination_type: i64,
        id: &str,
        config: &DestinationConfig,
    ) -> Result<(), AdverityError> {
        self.update(
            &destination_path(destination_type, id),
            config,
            "updating destination",
        )
        .await
    }

    pub async fn delete_destination(
        &self,
        destination_type: i64,
        id: &str,
    ) -> Result<(), AdverityError> {
        self.delete(
            &destination_path(destination_type, id),
            "deleting destination",
        )
        .await
    }

    pub async fn create_destination_mapping(
        &self,
        destination_type: i64,
        destination_id: &str,
        config: &DestinationMappingConfig,
    ) -> Result<DestinationMapping, AdverityError> {
        self.create(
            &mappings_path(destination_type, destination_id),
            config,
            "creating destination mapping",
        )
        .await
    }

    pub async fn read_destination_mapping(
        &self,
        destination_type: i64,
        destination_id: &str,
        id: &str,
    ) -> Result<DestinationMapping, AdverityError> {
        self.read(
            &format!("{}{}/", mappings_path(destination_type, destination_id), id),
            "reading destination mapping",
        )
        .await
    }

    pub async fn update_destination_mapping(
        &self,
        destination_type: i64,
        destination_id: &str,
        id: &str,
        config: &DestinationMappingConfig,
    ) -> Result<(), AdverityError> {
        self.update(
            &format!("{}{}/", mappings_path(destination_type, destination_id), id),
            config,
            "updating destination mapping",
        )
        .await
    }

    pub async fn delete_destination_mapping(
        &self,
        destination_type: i64,
        destination_id: &str,
        id: &str,
    ) -> Result<(), AdverityError> {
        self.delete(
            &format!("{}{}/", mappings_path(destination_type, destination_id), id),
            "deleting destination mapping",
        )
        .await
    }
}
