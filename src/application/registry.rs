//! Session Registry - Concurrent session ownership.
//!
//! One server process tutors many students at once. The registry keys
//! live sessions by id and wraps each in its own `tokio::sync::Mutex`,
//! so work on different sessions proceeds in parallel while turns
//! within one session stay strictly ordered.
//!
//! The registry writes through to the session store on registration and
//! on release, and revives sessions from the store when a known id has
//! no live handle (a previous process owned it).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::application::engine::EngineError;
use crate::domain::foundation::SessionId;
use crate::domain::session::TutoringSession;
use crate::ports::SessionStore;

/// Shared handle to one live session.
pub type SessionHandle = Arc<Mutex<TutoringSession>>;

/// Index of live sessions backed by a persistent store.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
    store: Arc<dyn SessionStore>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Registers a freshly started session and persists its initial state.
    ///
    /// # Errors
    ///
    /// - `Store` if the initial save fails; the session is not registered
    pub async fn register(&self, session: TutoringSession) -> Result<SessionHandle, EngineError> {
        let id = *session.id();
        self.store.save(&session).await?;

        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());

        debug!(session_id = %id, "Session registered");
        Ok(handle)
    }

    /// Returns the live handle for a session, reviving it from the
    /// store if no handle exists in this process.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the id is neither live nor stored
    /// - `Store` if the store lookup fails
    pub async fn checkout(&self, id: &SessionId) -> Result<SessionHandle, EngineError> {
        if let Some(handle) = self.sessions.read().await.get(id) {
            return Ok(handle.clone());
        }

        let session = self
            .store
            .load(id)
            .await?
            .ok_or(EngineError::SessionNotFound(*id))?;
        info!(session_id = %id, "Session revived from the store");

        let mut sessions = self.sessions.write().await;
        // A concurrent checkout may have revived it first; keep that one.
        let handle = sessions
            .entry(*id)
            .or_insert_with(|| Arc::new(Mutex::new(session)))
            .clone();
        Ok(handle)
    }

    /// Persists the current state of a session without releasing it.
    ///
    /// # Errors
    ///
    /// - `Store` if the save fails
    pub async fn save(&self, session: &TutoringSession) -> Result<(), EngineError> {
        self.store.save(session).await?;
        Ok(())
    }

    /// Persists a session's final state and drops its live handle.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session is not registered
    /// - `Store` if the final save fails; the handle is already released
    pub async fn release(&self, id: &SessionId) -> Result<(), EngineError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(id)
            .ok_or(EngineError::SessionNotFound(*id))?;

        let session = handle.lock().await;
        self.store.save(&session).await?;

        info!(session_id = %id, "Session released");
        Ok(())
    }

    /// Number of live sessions in this process.
    pub async fn live_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
