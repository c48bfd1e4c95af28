//! Vertex AI Agent Engine memory bank.

use crate::{MemoryEntry, MemoryService, Result, SearchMemoryResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use salesassist_cloud::{Operation, VertexClient};
use salesassist_core::{Content, Session};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

/// Memory bank attached to one Agent Engine.
///
/// Memories are generated server-side from session contents and retrieved by
/// similarity search, scoped to (app, user).
pub struct VertexAiMemoryBankService {
    client: VertexClient,
    engine: String,
}

impl VertexAiMemoryBankService {
    /// Create a service for `engine_id` (bare id or full resource name).
    pub fn new(client: VertexClient, engine_id: &str) -> Self {
        let engine = client.reasoning_engine(engine_id);
        Self { client, engine }
    }

    /// Agent Engine resource name.
    pub fn engine(&self) -> &str {
        &self.engine
    }
}

#[async_trait]
impl MemoryService for VertexAiMemoryBankService {
    fn name(&self) -> &str {
        "vertex-memory-bank"
    }

    async fn add_session_to_memory(&self, session: &Session) -> Result<()> {
        let events: Vec<SourceEvent<'_>> = session
            .events
            .iter()
            .filter_map(|e| e.content.as_ref())
            .filter(|c| c.texts().next().is_some())
            .map(|content| SourceEvent { content })
            .collect();

        if events.is_empty() {
            debug!("Session {} has no text to remember", session.id);
            return Ok(());
        }

        let body = GenerateRequest {
            direct_contents_source: DirectContentsSource { events },
            scope: json!({
                "app_name": session.app_name,
                "user_id": session.user_id,
            }),
        };

        let operation: Operation = self
            .client
            .post(&format!("{}/memories:generate", self.engine), &[], &body)
            .await?;
        info!(
            "Submitted session {} for memory generation ({})",
            session.id, operation.name
        );
        Ok(())
    }

    async fn search_memory(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<SearchMemoryResponse> {
        let body = json!({
            "scope": {"app_name": app_name, "user_id": user_id},
            "similaritySearchParams": {"searchQuery": query},
        });

        let response: RetrieveResponse = self
            .client
            .post(&format!("{}/memories:retrieve", self.engine), &[], &body)
            .await?;

        let memories = response
            .retrieved_memories
            .into_iter()
            .filter(|m| !m.memory.fact.is_empty())
            .map(|m| MemoryEntry {
                content: Content::user_text(m.memory.fact),
                author: Some("user".to_string()),
                timestamp: m.memory.update_time,
            })
            .collect();

        Ok(SearchMemoryResponse { memories })
    }
}

// Internal types for the memory bank API

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    direct_contents_source: DirectContentsSource<'a>,
    scope: serde_json::Value,
}

#[derive(Serialize)]
struct DirectContentsSource<'a> {
    events: Vec<SourceEvent<'a>>,
}

#[derive(Serialize)]
struct SourceEvent<'a> {
    content: &'a Content,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    retrieved_memories: Vec<RetrievedMemory>,
}

#[derive(Deserialize)]
struct RetrievedMemory {
    memory: Memory,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Memory {
    #[serde(default)]
    fact: String,
    #[serde(default)]
    update_time: Option<DateTime<Utc>>,
}
