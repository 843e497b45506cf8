//! Local file backend for state storage
//!
//! State lives in a JSON file (default: adverity.state.json) next to a
//! `.lock` file holding the current `LockInfo`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::fs;

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};
use crate::lock::LockInfo;
use crate::state::StateFile;

/// Default state file name
pub const DEFAULT_STATE_FILE: &str = "adverity.state.json";

pub struct LocalBackend {
    state_path: PathBuf,
    lock_path: PathBuf,
}

impl LocalBackend {
    /// Create a LocalBackend with a specific state file path
    pub fn with_path(state_path: impl Into<PathBuf>) -> Self {
        let state_path = state_path.into();
        let lock_path = state_path.with_extension("lock");
        Self {
            state_path,
            lock_path,
        }
    }

    /// Create a LocalBackend from configuration; `path` is optional
    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        if let Some(key) = config.attributes.keys().find(|k| k.as_str() != "path") {
            return Err(BackendError::configuration(format!(
                "unknown attribute '{}' for local backend",
                key
            )));
        }
        let path = config.get_string("path").unwrap_or(DEFAULT_STATE_FILE);
        if path.is_empty() {
            return Err(BackendError::configuration("path must not be empty"));
        }
        Ok(Self::with_path(path))
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    async fn read_lock(&self) -> BackendResult<Option<LockInfo>> {
        if !fs::try_exists(&self.lock_path).await? {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.lock_path).await?;
        let lock = serde_json::from_str(&content)
            .map_err(|e| BackendError::InvalidState(format!("Failed to parse lock file: {}", e)))?;
        Ok(Some(lock))
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::with_path(DEFAULT_STATE_FILE)
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        if !fs::try_exists(&self.state_path).await? {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.state_path).await?;
        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse state file: {}", e))
        })?;

        if state.version > StateFile::CURRENT_VERSION {
            return Err(BackendError::InvalidState(format!(
                "state file version {} is newer than supported version {}",
                state.version,
                StateFile::CURRENT_VERSION
            )));
        }

        Ok(Some(state))
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        if let Some(stored) = self.read_state().await?
            && stored.lineage != state.lineage
        {
            return Err(BackendError::LineageMismatch {
                expected: stored.lineage,
                actual: state.lineage.clone(),
            });
        }

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            BackendError::Serialization(format!("Failed to serialize state: {}", e))
        })?;

        // Write next to the target, then rename over it
        let tmp_path = self.state_path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &self.state_path).await?;
        debug!(
            "Wrote state serial {} to {}",
            state.serial,
            self.state_path.display()
        );

        Ok(())
    }

    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo> {
        // An unreadable lock file is treated as stale
        if let Ok(Some(existing)) = self.read_lock().await
            && !existing.is_expired()
        {
            return Err(BackendError::locked(&existing));
        }

        let lock = LockInfo::new(operation);
        let content = serde_json::to_string_pretty(&lock)
            .map_err(|e| BackendError::Serialization(format!("Failed to serialize lock: {}", e)))?;
        fs::write(&self.lock_path, content).await?;

        Ok(lock)
    }

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        let existing = self
            .read_lock()
            .await?
            .ok_or_else(|| BackendError::LockNotFound(lock.id.clone()))?;

        if existing.id != lock.id {
            return Err(BackendError::LockMismatch {
                expected: lock.id.clone(),
                actual: existing.id,
            });
        }

        fs::remove_file(&self.lock_path).await?;
        Ok(())
    }

    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()> {
        let existing = self
            .read_lock()
            .await?
            .ok_or_else(|| BackendError::LockNotFound(lock_id.to_string()))?;

        if existing.id != lock_id {
            return Err(BackendError::LockMismatch {
                expected: lock_id.to_string(),
                actual: existing.id,
            });
        }

        fs::remove_file(&self.lock_path).await?;
        Ok(())
    }

    fn location(&self) -> String {
        self.state_path.display().to_string()
    }
}
