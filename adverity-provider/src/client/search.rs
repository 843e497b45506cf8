use super::types::{Lookup, Page, TypeEntry};
use super::{AdverityClient, AdverityError};

/// Kinds of types that can be searched by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Connection,
    Datastream,
    Destination,
}

impl TypeKind {
    fn path(self) -> &'static str {
        match self {
            TypeKind::Connection => "connection-types/",
            TypeKind::Datastream => "datastream-types/",
            TypeKind::Destination => "target-types/",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TypeKind::Connection => "connection types",
            TypeKind::Datastream => "datastream types",
            TypeKind::Destination => "destination types",
        }
    }
}

impl AdverityClient {
    pub async fn search_types(
        &self,
        kind: TypeKind,
        search_term: &str,
    ) -> Result<Vec<TypeEntry>, AdverityError> {
        let url = self.url(kind.path())?;
        let params = [("search".to_string(), search_term.to_string())];
        let page: Page<TypeEntry> = self
            .query(url, &params, &format!("searching {}", kind.label()))
            .await?;
        Ok(page.results)
    }

    /// Call a lookup endpoint; `url` is relative to the instance root
    pub async fn lookup(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<Lookup, AdverityError> {
        let url = self.root_relative(url)?;
        self.query(url, params, "doing lookup").await
    }
}
