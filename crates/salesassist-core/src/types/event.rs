//! Conversation events.

use super::{Content, FunctionCall, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Author name used for events carrying user input.
pub const USER_AUTHOR: &str = "user";

/// One entry in a session's history, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event id.
    pub id: String,

    /// Turn this event belongs to.
    pub invocation_id: String,

    /// `user` or the name of the agent that produced it.
    pub author: String,

    /// Message content, absent for pure state updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    /// Emission time.
    pub timestamp: DateTime<Utc>,

    /// Session state changes carried by this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_delta: Option<HashMap<String, Value>>,

    /// Token usage of the model call that produced this event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl Event {
    /// Create a new event with a fresh id.
    pub fn new(invocation_id: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: crate::id::uuid(),
            invocation_id: invocation_id.into(),
            author: author.into(),
            content: None,
            timestamp: Utc::now(),
            state_delta: None,
            usage: None,
        }
    }

    /// Event carrying a user message.
    pub fn user_message(invocation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(invocation_id, USER_AUTHOR).with_content(Content::user_text(text))
    }

    /// Attach content.
    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    /// Attach a state delta.
    pub fn with_state_delta(mut self, delta: HashMap<String, Value>) -> Self {
        self.state_delta = Some(delta);
        self
    }

    /// Attach token usage.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Every text fragment in this event, in part order.
    pub fn text_fragments(&self) -> Vec<&str> {
        self.content
            .as_ref()
            .map(|c| c.texts().collect())
            .unwrap_or_default()
    }

    /// Function calls requested by the model in this event.
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.content
            .as_ref()
            .map(|c| c.function_calls().collect())
            .unwrap_or_default()
    }

    /// Whether this event was authored by the user.
    pub fn is_from_user(&self) -> bool {
        self.author == USER_AUTHOR
    }

    /// A model reply that needs no further tool round trip.
    pub fn is_final_response(&self) -> bool {
        match &self.content {
            Some(content) => {
                content.role == Role::Model
                    && content.function_calls().next().is_none()
                    && content.function_responses().next().is_none()
            }
            None => false,
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens.
    pub input: u64,

    /// Output tokens.
    pub output: u64,
}

impl TokenUsage {
    /// Get the total token count.
    pub fn total(&self) -> u64 {
        self.input + self.output
    }

    /// Add another usage to this one.
    pub fn add(&mut self, other: &TokenUsage) {
        self.input += other.input;
        self.output += other.output;
    }
}
