//! Vertex AI REST access.

use crate::auth::Credentials;
use crate::error::{CloudError, Result};
use crate::http;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// How many times a long-running operation is polled.
const OPERATION_POLL_ATTEMPTS: u32 = 20;

/// Delay between operation polls.
const OPERATION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Authorized client for one Vertex AI project and region.
#[derive(Debug, Clone)]
pub struct VertexClient {
    http: Client,
    credentials: Credentials,
    project_id: String,
    location: String,
    base_url: String,
}

impl VertexClient {
    /// Create a client for `project_id` in `location`.
    pub fn new(
        http: Client,
        credentials: Credentials,
        project_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        let location = location.into();
        Self {
            base_url: default_base_url(&location),
            http,
            credentials,
            project_id: project_id.into(),
            location,
        }
    }

    /// Set the API base URL (including the version segment).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Project id.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Region.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// `projects/{project}/locations/{location}`.
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.location)
    }

    /// Full resource name of a model publisher model.
    pub fn model_resource(&self, model: &str) -> String {
        if model.starts_with("projects/") {
            return model.to_string();
        }
        format!("{}/publishers/google/models/{}", self.parent(), model)
    }

    /// Full resource name of an Agent Engine.
    ///
    /// Accepts a bare numeric id or a full `projects/.../reasoningEngines/...` name.
    pub fn reasoning_engine(&self, engine_id: &str) -> String {
        if engine_id.contains('/') {
            return engine_id.trim_matches('/').to_string();
        }
        format!("{}/reasoningEngines/{}", self.parent(), engine_id)
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource.trim_start_matches('/'))
    }

    /// GET a resource.
    pub async fn get<T: DeserializeOwned>(&self, resource: &str, query: &[(&str, String)]) -> Result<T> {
        debug!("GET {}", resource);
        let request = self.http.get(self.url(resource)).query(query);
        http::send_json(request, &self.credentials).await
    }

    /// POST a JSON body to a resource or custom method.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T> {
        debug!("POST {}", resource);
        let request = self.http.post(self.url(resource)).query(query).json(body);
        http::send_json(request, &self.credentials).await
    }

    /// POST and return the raw response for streaming consumption.
    pub async fn post_streaming<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<Response> {
        debug!("POST (stream) {}", resource);
        let request = self.http.post(self.url(resource)).query(query).json(body);
        http::send(request, &self.credentials).await
    }

    /// Poll a long-running operation until it reports `done`.
    pub async fn wait_operation(&self, mut operation: Operation) -> Result<Operation> {
        let mut attempts = 0;
        while !operation.done {
            if attempts >= OPERATION_POLL_ATTEMPTS {
                return Err(CloudError::Operation {
                    name: operation.name,
                    message: "timed out waiting for completion".to_string(),
                });
            }
            attempts += 1;
            tokio::time::sleep(OPERATION_POLL_INTERVAL).await;
            operation = self.get(&operation.name, &[]).await?;
        }

        if let Some(status) = &operation.error {
            return Err(CloudError::Operation {
                name: operation.name.clone(),
                message: status.message.clone(),
            });
        }
        Ok(operation)
    }
}

/// Regional endpoint for `location`.
pub fn default_base_url(location: &str) -> String {
    if location == "global" {
        "https://aiplatform.googleapis.com/v1".to_string()
    } else {
        format!("https://{}-aiplatform.googleapis.com/v1", location)
    }
}

/// A long-running operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub done: bool,

    #[serde(default)]
    pub error: Option<OperationStatus>,

    #[serde(default)]
    pub response: Option<Value>,
}

/// Failure status of an operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub code: i32,

    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base: &str) -> VertexClient {
        VertexClient::new(
            Client::new(),
            Credentials::from_token("ya29.vertex").unwrap(),
            "acme-sales",
            "us-central1",
        )
        .with_base_url(base)
    }

    #[test]
    fn test_resource_names() {
        let c = client("http://localhost");
        assert_eq!(c.parent(), "projects/acme-sales/locations/us-central1");
        assert_eq!(
            c.model_resource("gemini-2.0-flash"),
            "projects/acme-sales/locations/us-central1/publishers/google/models/gemini-2.0-flash"
        );
        assert_eq!(
            c.reasoning_engine("123"),
            "projects/acme-sales/locations/us-central1/reasoningEngines/123"
        );
        assert_eq!(
            c.reasoning_engine("projects/p/locations/l/reasoningEngines/9"),
            "projects/p/locations/l/reasoningEngines/9"
        );
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(
            default_base_url("us-central1"),
            "https://us-central1-aiplatform.googleapis.com/v1"
        );
        assert_eq!(default_base_url("global"), "https://aiplatform.googleapis.com/v1");
    }

    #[tokio::test]
    async fn test_wait_operation_polls_until_done() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/operations/op-1"))
            .and(header("authorization", "Bearer ya29.vertex"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "operations/op-1",
                "done": true,
                "response": {"name": "sessions/s1"}
            })))
            .mount(&server)
            .await;

        let op = Operation {
            name: "operations/op-1".to_string(),
            ..Default::default()
        };
        let done = client(&server.uri()).wait_operation(op).await.unwrap();
        assert!(done.done);
        assert_eq!(done.response.unwrap()["name"], "sessions/s1");
    }

    #[tokio::test]
    async fn test_wait_operation_reports_error() {
        let op = Operation {
            name: "operations/op-2".to_string(),
            done: true,
            error: Some(OperationStatus {
                code: 9,
                message: "engine not ready".to_string(),
            }),
            response: None,
        };
        let err = client("http://localhost").wait_operation(op).await.unwrap_err();
        assert!(err.to_string().contains("engine not ready"));
    }
}
