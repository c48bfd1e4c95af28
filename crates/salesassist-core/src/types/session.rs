//! Session types for conversation management.

use super::{Event, SessionKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A conversation: ordered events plus a key/value state map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Application name.
    pub app_name: String,

    /// End user.
    pub user_id: String,

    /// Session id.
    pub id: String,

    /// Conversation state. Delegated credentials live here.
    #[serde(default)]
    pub state: HashMap<String, Value>,

    /// Events in emission order.
    #[serde(default)]
    pub events: Vec<Event>,

    /// Last modification time.
    pub last_update_time: DateTime<Utc>,
}

impl Session {
    /// Create an empty session.
    pub fn new(key: &SessionKey) -> Self {
        Self {
            app_name: key.app_name.clone(),
            user_id: key.user_id.clone(),
            id: key.session_id.clone(),
            state: HashMap::new(),
            events: Vec::new(),
            last_update_time: Utc::now(),
        }
    }

    /// Create a session with initial state.
    pub fn with_state(mut self, state: HashMap<String, Value>) -> Self {
        self.state = state;
        self
    }

    /// The key identifying this session.
    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.app_name, &self.user_id, &self.id)
    }

    /// Append an event, applying its state delta.
    pub fn append_event(&mut self, event: Event) {
        if let Some(delta) = &event.state_delta {
            for (key, value) in delta {
                self.state.insert(key.clone(), value.clone());
            }
        }
        self.last_update_time = event.timestamp;
        self.events.push(event);
    }

    /// Look up a non-empty string value in the state map.
    pub fn state_str(&self, key: &str) -> Option<&str> {
        self.state
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}
