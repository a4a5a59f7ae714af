use async_trait::async_trait;
use docseed_core::{CollectionSpec, IndexDescriptor, IndexSpec, UserSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// What a database handle reports when an administrative command fails.
///
/// `AlreadyExists` must be kept distinct from every other failure; the
/// executor turns it into an idempotent skip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("malformed directive: {0}")]
    Malformed(String),

    #[error("definition conflict: {0}")]
    DefinitionConflict(String),

    #[error("missing dependency: {0}")]
    MissingDependency(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("{0}")]
    Other(String),
}

impl HandleError {
    /// The fatal failure kind, or `None` for `AlreadyExists`.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            HandleError::AlreadyExists(_) => None,
            HandleError::PermissionDenied(_) => Some(FailureKind::PermissionDenied),
            HandleError::Malformed(_) => Some(FailureKind::MalformedDirective),
            HandleError::DefinitionConflict(_) => Some(FailureKind::DefinitionConflict),
            HandleError::MissingDependency(_) => Some(FailureKind::MissingDependency),
            HandleError::Connection(_) => Some(FailureKind::ConnectionError),
            HandleError::Other(_) => Some(FailureKind::Other),
        }
    }

    /// The underlying message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            HandleError::AlreadyExists(m)
            | HandleError::PermissionDenied(m)
            | HandleError::Malformed(m)
            | HandleError::DefinitionConflict(m)
            | HandleError::MissingDependency(m)
            | HandleError::Connection(m)
            | HandleError::Other(m) => m,
        }
    }
}

/// Fatal failure kinds surfaced by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    PermissionDenied,
    MalformedDirective,
    DefinitionConflict,
    MissingDependency,
    ConnectionError,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::PermissionDenied => "PermissionDenied",
            FailureKind::MalformedDirective => "MalformedDirective",
            FailureKind::DefinitionConflict => "DefinitionConflict",
            FailureKind::MissingDependency => "MissingDependency",
            FailureKind::ConnectionError => "ConnectionError",
            FailureKind::Other => "Other",
        };
        f.write_str(s)
    }
}

/// Administrative access to a document database, addressed per logical
/// database name.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    /// Create `user.username` in `user.database` with its role grants.
    async fn create_user(&self, user: &UserSpec) -> Result<(), HandleError>;

    /// Create a collection.
    async fn create_collection(&self, collection: &CollectionSpec) -> Result<(), HandleError>;

    /// Create an index with the given key order and uniqueness.
    async fn create_index(&self, index: &IndexSpec) -> Result<(), HandleError>;

    /// Indexes currently defined on a collection. A missing collection has none.
    async fn list_indexes(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<IndexDescriptor>, HandleError>;

    async fn user_exists(&self, database: &str, username: &str) -> Result<bool, HandleError>;

    async fn collection_exists(&self, database: &str, name: &str) -> Result<bool, HandleError>;

    /// Whether `create_index` on a missing collection creates the collection
    /// instead of failing with `MissingDependency`.
    fn creates_collections_implicitly(&self) -> bool {
        true
    }
}
