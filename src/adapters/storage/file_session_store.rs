//! File-based Session Store Adapter
//!
//! Stores session snapshots as JSON files on disk, one file per
//! session. Handy for local development and for inspecting a session
//! after the fact.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::SessionId;
use crate::domain::session::TutoringSession;
use crate::ports::{SessionStore, SessionStoreError};

/// File-based storage for session snapshots
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    /// Create a new file store with a base directory
    ///
    /// # Example
    /// ```ignore
    /// let store = FileSessionStore::new("./data/sessions");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Get the file path for a session
    fn session_file_path(&self, id: &SessionId) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }

    /// Ensure the base directory exists
    async fn ensure_base_dir(&self) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| SessionStoreError::backend(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, session: &TutoringSession) -> Result<(), SessionStoreError> {
        self.ensure_base_dir().await?;

        let json = serde_json::to_string_pretty(session)
            .map_err(|e| SessionStoreError::serialization(e.to_string()))?;

        // Write via a temporary file, then rename (atomic on Unix)
        let file_path = self.session_file_path(session.id());
        let temp_path = file_path.with_extension("tmp");
        fs::write(&temp_path, json)
            .await
            .map_err(|e| SessionStoreError::backend(e.to_string()))?;
        fs::rename(&temp_path, &file_path)
            .await
            .map_err(|e| SessionStoreError::backend(e.to_string()))?;

        Ok(())
    }

    async fn load(&self, id: &SessionId) -> Result<Option<TutoringSession>, SessionStoreError> {
        let file_path = self.session_file_path(id);

        if !file_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&file_path)
            .await
            .map_err(|e| SessionStoreError::backend(e.to_string()))?;

        let session = serde_json::from_str(&json)
            .map_err(|e| SessionStoreError::serialization(e.to_string()))?;

        Ok(Some(session))
    }
}
