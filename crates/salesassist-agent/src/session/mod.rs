//! Session storage.
//!
//! A [`SessionService`] owns sessions and their event history. The runner
//! appends every event through the service before yielding it, so what the
//! caller sees is exactly what was stored.

mod vertex;

pub use vertex::VertexAiSessionService;

use crate::error::AgentError;
use crate::Result;
use async_trait::async_trait;
use salesassist_core::types::{Event, Session, SessionKey};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Storage backend for sessions.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Create a session with initial state.
    async fn create_session(
        &self,
        key: &SessionKey,
        state: HashMap<String, Value>,
    ) -> Result<Session>;

    /// Load a session with its events, or `None` if it does not exist.
    async fn get_session(&self, key: &SessionKey) -> Result<Option<Session>>;

    /// Persist `event` and apply it to `session`.
    async fn append_event(&self, session: &mut Session, event: Event) -> Result<()>;
}

/// Sessions kept in process memory, lost on exit.
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl Default for InMemorySessionService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionService {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn create_session(
        &self,
        key: &SessionKey,
        state: HashMap<String, Value>,
    ) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(key) {
            return Err(AgentError::SessionExists(key.to_string()));
        }

        let session = Session::new(key).with_state(state);
        sessions.insert(key.clone(), session.clone());
        debug!("Created session {}", key);
        Ok(session)
    }

    async fn get_session(&self, key: &SessionKey) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(key).cloned())
    }

    async fn append_event(&self, session: &mut Session, event: Event) -> Result<()> {
        let key = session.key();
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&key)
            .ok_or_else(|| AgentError::SessionNotFound(key.to_string()))?;

        stored.append_event(event.clone());
        session.append_event(event);
        Ok(())
    }
}
