//! State backend trait and error types

use std::collections::HashMap;

use adverity_core::manifest::BackendBlock;
use adverity_core::resource::Value;
use async_trait::async_trait;
use thiserror::Error;

use crate::lock::LockInfo;
use crate::state::StateFile;

/// Errors that can occur when interacting with a state backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Another command holds the lock
    #[error("State is locked: {operation} by {who} holds lock {lock_id}. Run `adverity force-unlock {lock_id}` if that command is gone")]
    Locked {
        lock_id: String,
        who: String,
        operation: String,
    },

    #[error("No lock with id {0} is held")]
    LockNotFound(String),

    /// The held lock belongs to someone else
    #[error("Lock {actual} is not the held lock {expected}")]
    LockMismatch { expected: String, actual: String },

    #[error("Unsupported backend type: {0}")]
    UnsupportedBackend(String),

    #[error("Invalid [backend] table: {0}")]
    Configuration(String),

    #[error("Unreadable state: {0}")]
    InvalidState(String),

    /// The state being written does not descend from the stored one
    #[error("Refusing to overwrite state of lineage {expected} with lineage {actual}")]
    LineageMismatch { expected: String, actual: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Could not encode state: {0}")]
    Serialization(String),
}

impl BackendError {
    pub fn locked(lock: &LockInfo) -> Self {
        Self::Locked {
            lock_id: lock.id.clone(),
            who: lock.who.clone(),
            operation: lock.operation.clone(),
        }
    }

    pub fn unsupported_backend(backend_type: impl Into<String>) -> Self {
        Self::UnsupportedBackend(backend_type.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        BackendError::Io(e.to_string())
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Trait for state storage backends
///
/// Stores and retrieves state files and manages the lock that serializes
/// mutating commands.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Read the current state from the backend
    ///
    /// Returns `None` if no state exists (first-time use)
    async fn read_state(&self) -> BackendResult<Option<StateFile>>;

    /// Write the state to the backend
    ///
    /// The state's serial number should be incremented before calling this.
    /// Writing a state whose lineage differs from the stored one fails.
    async fn write_state(&self, state: &StateFile) -> BackendResult<()>;

    /// Acquire a lock for the given operation
    ///
    /// Fails if a lock is already held and has not expired
    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo>;

    /// Release a previously acquired lock
    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()>;

    /// Force release a lock by its ID
    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()>;

    /// Human readable location of the state (for CLI output)
    fn location(&self) -> String;
}

/// Configuration for a state backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend type ("local")
    pub backend_type: String,
    /// Backend-specific attributes
    pub attributes: HashMap<String, Value>,
}

impl BackendConfig {
    /// Get a string attribute value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&BackendBlock> for BackendConfig {
    fn from(block: &BackendBlock) -> Self {
        Self {
            backend_type: block.backend_type.clone(),
            attributes: block.attributes.clone(),
        }
    }
}
