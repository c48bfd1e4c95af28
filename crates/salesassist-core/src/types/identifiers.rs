//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one conversation: (app name, user id, session id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Application the session belongs to.
    pub app_name: String,

    /// End user.
    pub user_id: String,

    /// Session id, unique per (app, user).
    pub session_id: String,
}

impl SessionKey {
    /// Create a new session key.
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Key of the (app, user) pair that owns long-term memory.
    pub fn memory_scope(&self) -> MemoryScope {
        MemoryScope::new(&self.app_name, &self.user_id)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// Scope of long-term memories: one user of one app.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryScope {
    /// Application name.
    pub app_name: String,

    /// End user.
    pub user_id: String,
}

impl MemoryScope {
    /// Create a new memory scope.
    pub fn new(app_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
        }
    }
}

impl fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.user_id)
    }
}
