//! Long-term conversation memory for SalesAssist.
//!
//! This crate provides:
//! - The [`MemoryService`] trait the runner talks to
//! - An in-process store with keyword search
//! - A client for the Vertex AI Agent Engine memory bank

pub mod error;
pub mod search;
pub mod store;
pub mod vertex;

pub use error::MemoryError;
pub use search::{keyword_score, tokenize};
pub use store::InMemoryMemoryService;
pub use vertex::VertexAiMemoryBankService;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use salesassist_core::{Content, Session};
use serde::{Deserialize, Serialize};

/// Result type for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;

/// A remembered piece of conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Remembered content.
    pub content: Content,

    /// Who said it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// When it was said or last updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MemoryEntry {
    /// Text of the entry.
    pub fn text(&self) -> String {
        self.content.joined_text()
    }
}

/// Memories matching a query, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchMemoryResponse {
    pub memories: Vec<MemoryEntry>,
}

/// Storage for memories that outlive a single session.
#[async_trait]
pub trait MemoryService: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Ingest a finished (or in-progress) session.
    async fn add_session_to_memory(&self, session: &Session) -> Result<()>;

    /// Search memories of one user of one app.
    async fn search_memory(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<SearchMemoryResponse>;
}
