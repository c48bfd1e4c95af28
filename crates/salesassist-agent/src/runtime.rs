//! Runtime assembly: backend selection and runner construction.

use crate::agent::{Agent, AgentCell};
use crate::auth::CredentialResolver;
use crate::error::AgentError;
use crate::providers::{GeminiProvider, ModelProvider};
use crate::runner::Runner;
use crate::session::{InMemorySessionService, SessionService, VertexAiSessionService};
use crate::Result;
use reqwest::Client;
use salesassist_cloud::{BigQueryConnector, Credentials, VertexClient};
use salesassist_core::{Backend, Config};
use salesassist_memory::{InMemoryMemoryService, MemoryService, VertexAiMemoryBankService};
use std::sync::Arc;
use tracing::info;

/// Build a runner bound to `agent`, with backends chosen by `config`.
///
/// `vertex` is required only when a remote backend is selected. The choice
/// is made once here; there is no fallback between backends.
pub fn build_runner(
    config: &Config,
    agent: Arc<Agent>,
    provider: Arc<dyn ModelProvider>,
    vertex: Option<&VertexClient>,
) -> Result<Runner> {
    let memory_backend = config.memory_backend();
    let session_backend = config.session_backend();

    let memory_service: Arc<dyn MemoryService> = match &memory_backend {
        Backend::Remote { engine_id } => {
            let client = vertex.ok_or_else(|| {
                AgentError::config("Agent Engine memory requires a Vertex AI client")
            })?;
            info!("Using Vertex AI Agent Engine Memory (ID: {})", engine_id);
            Arc::new(VertexAiMemoryBankService::new(client.clone(), engine_id))
        }
        Backend::Local => {
            info!("Using In-Memory Memory Service (Local)");
            Arc::new(InMemoryMemoryService::new())
        }
    };

    let session_service: Arc<dyn SessionService> = match &session_backend {
        Backend::Remote { engine_id } => {
            let client = vertex.ok_or_else(|| {
                AgentError::config("Agent Engine sessions require a Vertex AI client")
            })?;
            info!("Using Vertex AI Agent Engine Sessions (ID: {})", engine_id);
            Arc::new(VertexAiSessionService::new(client.clone(), engine_id))
        }
        Backend::Local => {
            info!("Using In-Memory Session Service (Local)");
            Arc::new(InMemorySessionService::new())
        }
    };

    Ok(
        Runner::new(agent, provider, session_service, memory_service)
            .with_backends(session_backend, memory_backend),
    )
}

/// Connect to Google Cloud with application default credentials and build
/// the production runner.
pub async fn connect(config: &Config, cell: &AgentCell, http: &Client) -> Result<Runner> {
    let credentials = Credentials::application_default(http).await?;
    info!("Resolved application default credentials ({:?})", credentials.kind());

    let vertex = VertexClient::new(
        http.clone(),
        credentials,
        &config.project_id,
        &config.location,
    );
    let provider = Arc::new(GeminiProvider::new(vertex.clone(), &config.model));

    let resolver = Arc::new(CredentialResolver::new(
        config,
        Arc::new(BigQueryConnector::new(http.clone())),
    ));
    let agent = cell.get_or_create(config, resolver).await;

    build_runner(config, agent, provider, Some(&vertex))
}
