//! Adverity State Management
//!
//! Persists what has been created on the Adverity instance so later runs can
//! refresh, update and delete it. State is a JSON file guarded by a lock file.
//!
//! # Example
//!
//! ```ignore
//! use adverity_state::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::from(&manifest.backend))?;
//!
//! let lock = backend.acquire_lock("apply").await?;
//! let mut state = backend.read_state().await?.unwrap_or_default();
//!
//! // ... record outcomes ...
//!
//! state.increment_serial();
//! backend.write_state(&state).await?;
//! backend.release_lock(&lock).await?;
//! ```

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

// Re-export main types for convenience
pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::{DEFAULT_STATE_FILE, LocalBackend, create_backend};
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
