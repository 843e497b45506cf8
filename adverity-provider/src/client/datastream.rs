use serde_json::{Map, Value as Json};

use super::types::{Datastream, DatastreamCommon, DatastreamDatatype, EnableDatastream};
use super::{AdverityClient, AdverityError};

fn typed_path(datastream_type_id: i64, id: &str) -> String {
    format!("datastream-types/{}/datastreams/{}/", datastream_type_id, id)
}

fn common_path(id: &str) -> String {
    format!("datastreams/{}/", id)
}

impl AdverityClient {
    /// Create a datastream from a flat body (common fields and type parameters)
    pub async fn create_datastream(
        &self,
        datastream_type_id: i64,
        body: &Map<String, Json>,
    ) -> Result<Datastream, AdverityError> {
        self.create(
            &format!("datastream-types/{}/datastreams/", datastream_type_id),
            body,
            "creating datastream",
        )
        .await
    }

    pub async fn read_datastream(
        &self,
        datastream_type_id: i64,
        id: &str,
    ) -> Result<Datastream, AdverityError> {
        self.read(&typed_path(datastream_type_id, id), "reading datastream")
            .await
    }

    /// Read through the type-independent endpoint
    pub async fn read_datastream_common(&self, id: &str) -> Result<Datastream, AdverityError> {
        self.read(&common_path(id), "reading datastream").await
    }

    pub async fn update_datastream_common(
        &self,
        id: &str,
        config: &DatastreamCommon,
    ) -> Result<(), AdverityError> {
        self.update(&common_path(id), config, "updating datastream")
            .await
    }

    pub async fn set_datastream_datatype(
        &self,
        id: &str,
        datatype: &str,
    ) -> Result<(), AdverityError> {
        let body = DatastreamDatatype {
            datatype: datatype.to_string(),
        };
        self.update(
            &common_path(id),
            &body,
            "setting datatype of Datastream",
        )
        .await
    }

    pub async fn enable_datastream(&self, id: &str, enabled: bool) -> Result<(), AdverityError> {
        self.update(
            &common_path(id),
            &EnableDatastream { enabled },
            "enabling or disabling datastream",
        )
        .await
    }

    /// PATCH the type specific parameters
    pub async fn update_datastream_specific(
        &self,
        datastream_type_id: i64,
        id: &str,
        body: &Map<String, Json>,
    ) -> Result<(), AdverityError> {
        self.update(
            &typed_path(datastream_type_id, id),
            body,
            "updating datastream",
        )
        .await
    }

    pub async fn delete_datastream(
        &self,
        datastream_type_id: i64,
        id: &str,
    ) -> Result<(), AdverityError> {
        self.delete(&typed_path(datastream_type_id, id), "deleting datastream")
            .await
    }
}
