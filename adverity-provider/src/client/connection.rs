use serde_json::{Map, Value as Json};

use super::types::{AuthorizeUrl, Connection, ConnectionOptions};
use super::{AdverityClient, AdverityError};

fn connections_path(connection_type_id: i64) -> String {
    format!("connection-types/{}/connections/", connection_type_id)
}

fn connection_path(connection_type_id: i64, id: &str) -> String {
    format!("{}{}/", connections_path(connection_type_id), id)
}

impl AdverityClient {
    /// Create a connection; `body` is the flat `{name, stack, ...parameters}` object
    pub async fn create_connection(
        &self,
        connection_type_id: i64,
        body: &Map<String, Json>,
    ) -> Result<Connection, AdverityError> {
        self.create(
            &connections_path(connection_type_id),
            body,
            "creating connection",
        )
        .await
    }

    pub async fn read_connection(
        &self,
        connection_type_id: i64,
        id: &str,
    ) -> Result<Connection, AdverityError> {
        self.read(
            &connection_path(connection_type_id, id),
            "reading connection",
        )
        .await
    }

    pub async fn update_connection(
        &self,
        connection_type_id: i64,
        id: &str,
        body: &Map<String, Json>,
    ) -> Result<(), AdverityError> {
        self.update(
            &connection_path(connection_type_id, id),
            body,
            "updating connection",
        )
        .await
    }

    pub async fn delete_connection(
        &self,
        connection_type_id: i64,
        id: &str,
    ) -> Result<(), AdverityError> {
        self.delete(
            &connection_path(connection_type_id, id),
            "deleting connection",
        )
        .await
    }

    /// URL a user visits to authorise a connection
    pub async fn connection_auth_url(
        &self,
        connection_type_id: i64,
        id: &str,
    ) -> Result<String, AdverityError> {
        let answer: AuthorizeUrl = self
            .read(
                &format!("{}authorize/", connection_path(connection_type_id, id)),
                "reading authorization url",
            )
            .await?;
        Ok(answer.url)
    }

    pub async fn connection_options(
        &self,
        connection_type_id: i64,
    ) -> Result<ConnectionOptions, AdverityError> {
        self.options(
            &connections_path(connection_type_id),
            "querying connection apps",
        )
        .await
    }
}
