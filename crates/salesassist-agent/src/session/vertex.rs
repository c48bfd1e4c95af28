//! Agent Engine managed sessions.

use super::SessionService;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use salesassist_cloud::{CloudError, Operation, VertexClient};
use salesassist_core::types::{Content, Event, Session, SessionKey};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info};

/// Sessions stored in a Vertex AI Agent Engine.
pub struct VertexAiSessionService {
    client: VertexClient,
    engine: String,
}

impl VertexAiSessionService {
    /// Create a service for `engine_id` (bare id or full resource name).
    pub fn new(client: VertexClient, engine_id: &str) -> Self {
        let engine = client.reasoning_engine(engine_id);
        Self { client, engine }
    }

    /// Agent Engine resource name.
    pub fn engine(&self) -> &str {
        &self.engine
    }

    fn session_resource(&self, session_id: &str) -> String {
        format!("{}/sessions/{}", self.engine, session_id)
    }

    async fn list_events(&self, key: &SessionKey) -> Result<Vec<Event>> {
        let resource = format!("{}/events", self.session_resource(&key.session_id));
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = Vec::new();
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }
            let page: ListEventsResponse = self.client.get(&resource, &query).await?;
            events.extend(page.session_events.into_iter().map(RemoteEvent::into_event));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(events)
    }
}

#[async_trait]
impl SessionService for VertexAiSessionService {
    fn name(&self) -> &str {
        "agent-engine"
    }

    async fn create_session(
        &self,
        key: &SessionKey,
        state: HashMap<String, Value>,
    ) -> Result<Session> {
        let body = json!({
            "userId": key.user_id,
            "sessionState": state,
        });
        let operation: Operation = self
            .client
            .post(
                &format!("{}/sessions", self.engine),
                &[("sessionId", key.session_id.clone())],
                &body,
            )
            .await?;
        self.client.wait_operation(operation).await?;

        info!("Created Agent Engine session {}", key);
        Ok(Session::new(key).with_state(state))
    }

    async fn get_session(&self, key: &SessionKey) -> Result<Option<Session>> {
        let remote: RemoteSession = match self
            .client
            .get(&self.session_resource(&key.session_id), &[])
            .await
        {
            Ok(session) => session,
            Err(CloudError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if remote.user_id != key.user_id {
            debug!(
                "Session {} belongs to another user, treating as missing",
                key.session_id
            );
            return Ok(None);
        }

        let mut session = Session::new(key).with_state(remote.session_state);
        session.events = self.list_events(key).await?;
        if let Some(updated) = remote.update_time {
            session.last_update_time = updated;
        }
        Ok(Some(session))
    }

    async fn append_event(&self, session: &mut Session, event: Event) -> Result<()> {
        let body = AppendEventRequest {
            author: &event.author,
            invocation_id: &event.invocation_id,
            timestamp: event.timestamp,
            content: event.content.as_ref(),
            actions: event.state_delta.as_ref().map(|delta| EventActions {
                state_delta: delta.clone(),
            }),
        };

        let _: Value = self
            .client
            .post(
                &format!("{}:appendEvent", self.session_resource(&session.id)),
                &[],
                &body,
            )
            .await?;

        session.append_event(event);
        Ok(())
    }
}

// Internal types for the sessions API

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteSession {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    session_state: HashMap<String, Value>,
    update_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEventsResponse {
    #[serde(default)]
    session_events: Vec<RemoteEvent>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteEvent {
    #[serde(default)]
    name: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    invocation_id: String,
    timestamp: Option<DateTime<Utc>>,
    content: Option<Content>,
    actions: Option<RemoteActions>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteActions {
    state_delta: Option<HashMap<String, Value>>,
}

impl RemoteEvent {
    fn into_event(self) -> Event {
        let mut event = Event::new(self.invocation_id, self.author);
        if let Some(id) = self.name.rsplit('/').next().filter(|s| !s.is_empty()) {
            event.id = id.to_string();
        }
        if let Some(ts) = self.timestamp {
            event.timestamp = ts;
        }
        event.content = self.content;
        event.state_delta = self.actions.and_then(|a| a.state_delta);
        event
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppendEventRequest<'a> {
    author: &'a str,
    invocation_id: &'a str,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actions: Option<EventActions>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventActions {
    state_delta: HashMap<String, Value>,
}
