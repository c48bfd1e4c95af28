//! Client for an agent deployed to Vertex AI Agent Engine.
//!
//! `streamQuery` answers with one JSON event per line. Only the text parts
//! are kept; tool traffic stays on the server.

use crate::error::AgentError;
use crate::runner::EventStream;
use async_stream::stream;
use futures::StreamExt;
use salesassist_cloud::VertexClient;
use salesassist_core::types::{Content, Event, Part, Role};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Streams questions to a deployed agent.
pub struct RemoteAgentClient {
    client: VertexClient,
    engine: String,
}

impl RemoteAgentClient {
    /// Create a client for `engine_id` (bare id or full resource name).
    pub fn new(client: VertexClient, engine_id: &str) -> Self {
        let engine = client.reasoning_engine(engine_id);
        Self { client, engine }
    }

    /// Agent Engine resource name.
    pub fn engine(&self) -> &str {
        &self.engine
    }

    /// Send `message` as `user_id` and stream the agent's events.
    pub fn stream_query(&self, user_id: &str, message: &str) -> EventStream<'_> {
        let body = json!({
            "class_method": "stream_query",
            "input": {"user_id": user_id, "message": message},
        });

        Box::pin(stream! {
            let resource = format!("{}:streamQuery", self.engine);
            let response = match self.client.post_streaming(&resource, &[], &body).await {
                Ok(r) => r,
                Err(e) => {
                    yield Err(AgentError::from(e));
                    return;
                }
            };

            let mut bytes = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(AgentError::Http(e));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                        yield Ok(event);
                    }
                }
            }

            if let Some(event) = parse_line(&String::from_utf8_lossy(&buffer)) {
                yield Ok(event);
            }
        })
    }
}

/// Parse one streamed line; blank and malformed lines are skipped.
fn parse_line(line: &str) -> Option<Event> {
    let line = line.trim();
    let line = line.strip_prefix("data:").map(str::trim).unwrap_or(line);
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<RemoteEvent>(line) {
        Ok(remote) => Some(remote.into_event()),
        Err(e) => {
            warn!("Skipping unparseable stream line: {}", e);
            None
        }
    }
}

#[derive(Deserialize)]
struct RemoteEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "invocationId")]
    invocation_id: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    content: Option<RemoteContent>,
}

#[derive(Deserialize)]
struct RemoteContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Value>,
}

impl RemoteEvent {
    fn into_event(self) -> Event {
        let mut event = Event::new(
            self.invocation_id.unwrap_or_default(),
            self.author.unwrap_or_default(),
        );
        if let Some(id) = self.id {
            event.id = id;
        }

        if let Some(content) = self.content {
            let role = match content.role.as_deref() {
                Some("user") => Role::User,
                _ => Role::Model,
            };
            let parts: Vec<Part> = content
                .parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .map(Part::text)
                .collect();
            debug!("Remote event from '{}' with {} text parts", event.author, parts.len());
            event.content = Some(Content::new(role, parts));
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesassist_cloud::Credentials;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENGINE: &str = "projects/acme-sales/locations/us-central1/reasoningEngines/77";

    fn client(server: &MockServer) -> RemoteAgentClient {
        let vertex = VertexClient::new(
            reqwest::Client::new(),
            Credentials::from_token("ya29.test").unwrap(),
            "acme-sales",
            "us-central1",
        )
        .with_base_url(server.uri());
        RemoteAgentClient::new(vertex, "77")
    }

    #[test]
    fn test_parse_line_keeps_text_parts() {
        let event = parse_line(
            r#"{"id": "ev-1", "invocation_id": "e-1", "author": "sales_assist_agent", "content": {"role": "model", "parts": [{"function_call": {"name": "get_table_schema"}}, {"text": "The table has 4 columns."}]}}"#,
        )
        .unwrap();
        assert_eq!(event.id, "ev-1");
        assert_eq!(event.author, "sales_assist_agent");
        assert_eq!(event.text_fragments(), vec!["The table has 4 columns."]);
    }

    #[test]
    fn test_parse_line_skips_noise() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   \n").is_none());
        assert!(parse_line("not json").is_none());
        assert!(parse_line(r#"data: {"author": "x"}"#).is_some());
    }

    #[tokio::test]
    async fn test_stream_query() {
        let server = MockServer::start().await;
        let body = [
            r#"{"author": "sales_assist_agent", "content": {"role": "model", "parts": [{"function_call": {"name": "get_table_schema", "args": {}}}]}}"#,
            r#"{"author": "sales_assist_agent", "content": {"role": "user", "parts": [{"function_response": {"name": "get_table_schema"}}]}}"#,
            r#"{"author": "sales_assist_agent", "content": {"role": "model", "parts": [{"text": "Columns: id, amount."}]}}"#,
        ]
        .join("\n");

        Mock::given(method("POST"))
            .and(path(format!("/{}:streamQuery", ENGINE)))
            .and(body_partial_json(json!({
                "class_method": "stream_query",
                "input": {"user_id": "test-user-001", "message": "What is the schema?"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let events: Vec<Event> = client
            .stream_query("test-user-001", "What is the schema?")
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(events.len(), 3);
        let text: String = events.iter().flat_map(|e| e.text_fragments()).collect();
        assert_eq!(text, "Columns: id, amount.");
    }

    #[tokio::test]
    async fn test_stream_query_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "ReasoningEngine 77 not found"}
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let results: Vec<_> = client.stream_query("u", "q").collect().await;
        assert_eq!(results.len(), 1);
        let err = results.into_iter().next().unwrap().unwrap_err();
        assert!(err.to_string().contains("ReasoningEngine 77 not found"));
    }
}
