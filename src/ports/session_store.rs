//! Session Store Port - Interface for session persistence.
//!
//! Save/load semantics only; querying and reporting belong elsewhere.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::session::TutoringSession;

/// Port for persisting tutoring sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists the session, replacing any previous version.
    async fn save(&self, session: &TutoringSession) -> Result<(), SessionStoreError>;

    /// Loads a session; `None` if it was never saved.
    async fn load(&self, id: &SessionId) -> Result<Option<TutoringSession>, SessionStoreError>;
}

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    /// The session could not be encoded or decoded.
    #[error("session serialization failed: {0}")]
    Serialization(String),

    /// The backing store failed.
    #[error("session store failure: {0}")]
    Backend(String),
}

impl SessionStoreError {
    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}
