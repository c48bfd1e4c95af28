//! In-process memory store.

use crate::search::{keyword_score, tokenize};
use crate::{MemoryEntry, MemoryService, Result, SearchMemoryResponse};
use async_trait::async_trait;
use salesassist_core::{Event, MemoryScope, Session};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Memory kept in process memory, keyed by (app, user) then session id.
///
/// Re-adding a session replaces its previous snapshot. Search returns events
/// sharing at least one word with the query, most overlapping first.
pub struct InMemoryMemoryService {
    sessions: RwLock<HashMap<MemoryScope, HashMap<String, Vec<Event>>>>,
}

impl Default for InMemoryMemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMemoryService {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of sessions remembered for a scope.
    pub async fn session_count(&self, scope: &MemoryScope) -> usize {
        let sessions = self.sessions.read().await;
        sessions.get(scope).map(HashMap::len).unwrap_or(0)
    }
}

#[async_trait]
impl MemoryService for InMemoryMemoryService {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn add_session_to_memory(&self, session: &Session) -> Result<()> {
        let events: Vec<Event> = session
            .events
            .iter()
            .filter(|e| !e.text_fragments().is_empty())
            .cloned()
            .collect();

        debug!("Remembering {} events from session {}", events.len(), session.id);

        let scope = MemoryScope::new(&session.app_name, &session.user_id);
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(scope)
            .or_default()
            .insert(session.id.clone(), events);
        Ok(())
    }

    async fn search_memory(
        &self,
        app_name: &str,
        user_id: &str,
        query: &str,
    ) -> Result<SearchMemoryResponse> {
        let words = tokenize(query);
        let scope = MemoryScope::new(app_name, user_id);
        let sessions = self.sessions.read().await;

        let Some(by_session) = sessions.get(&scope) else {
            return Ok(SearchMemoryResponse::default());
        };

        let mut scored: Vec<(usize, &Event)> = by_session
            .values()
            .flatten()
            .filter_map(|event| {
                let text = event.text_fragments().concat();
                let score = keyword_score(&words, &text);
                (score > 0).then_some((score, event))
            })
            .collect();

        // Highest overlap first, then oldest first.
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.timestamp.cmp(&b.1.timestamp)));

        let memories = scored
            .into_iter()
            .filter_map(|(_, event)| {
                event.content.clone().map(|content| MemoryEntry {
                    content,
                    author: Some(event.author.clone()),
                    timestamp: Some(event.timestamp),
                })
            })
            .collect();

        Ok(SearchMemoryResponse { memories })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesassist_core::{Content, SessionKey};

    fn session(id: &str, user: &str, texts: &[(&str, &str)]) -> Session {
        let mut session = Session::new(&SessionKey::new("sales-assist-app", user, id));
        for (author, text) in texts {
            let content = if *author == "user" {
                Content::user_text(*text)
            } else {
                Content::model_text(*text)
            };
            session.append_event(Event::new("e-1", *author).with_content(content));
        }
        session
    }

    #[tokio::test]
    async fn test_search_matches_keywords() {
        let memory = InMemoryMemoryService::new();
        memory
            .add_session_to_memory(&session(
                "s1",
                "alice",
                &[
                    ("user", "Which region had the most revenue?"),
                    ("sales_assist_agent", "EMEA had the most revenue last quarter."),
                    ("sales_assist_agent", "Anything else?"),
                ],
            ))
            .await
            .unwrap();

        let found = memory
            .search_memory("sales-assist-app", "alice", "EMEA revenue")
            .await
            .unwrap();

        assert_eq!(found.memories.len(), 2);
        assert_eq!(found.memories[0].text(), "EMEA had the most revenue last quarter.");
        assert_eq!(found.memories[0].author.as_deref(), Some("sales_assist_agent"));
    }

    #[tokio::test]
    async fn test_search_is_scoped_to_user() {
        let memory = InMemoryMemoryService::new();
        memory
            .add_session_to_memory(&session("s1", "alice", &[("user", "revenue by region")]))
            .await
            .unwrap();

        let found = memory
            .search_memory("sales-assist-app", "bob", "revenue")
            .await
            .unwrap();
        assert!(found.memories.is_empty());
    }

    #[tokio::test]
    async fn test_readding_session_replaces_snapshot() {
        let memory = InMemoryMemoryService::new();
        memory
            .add_session_to_memory(&session("s1", "alice", &[("user", "revenue")]))
            .await
            .unwrap();
        memory
            .add_session_to_memory(&session(
                "s1",
                "alice",
                &[("user", "revenue"), ("sales_assist_agent", "revenue was 10")],
            ))
            .await
            .unwrap();

        let scope = MemoryScope::new("sales-assist-app", "alice");
        assert_eq!(memory.session_count(&scope).await, 1);

        let found = memory
            .search_memory("sales-assist-app", "alice", "revenue")
            .await
            .unwrap();
        assert_eq!(found.memories.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_query_matches_nothing() {
        let memory = InMemoryMemoryService::new();
        memory
            .add_session_to_memory(&session("s1", "alice", &[("user", "revenue")]))
            .await
            .unwrap();

        let found = memory
            .search_memory("sales-assist-app", "alice", "  ")
            .await
            .unwrap();
        assert!(found.memories.is_empty());
    }
}
