//! Agent assembly and turn runtime for SalesAssist.
//!
//! This crate provides:
//! - Credential resolution for warehouse calls (delegated token or ADC)
//! - The BigQuery data tools and the tool execution framework
//! - The sales agent, built once per process
//! - Session backends, the runner and the turn loop
//! - A client for agents deployed to Agent Engine

pub mod agent;
pub mod auth;
pub mod error;
pub mod providers;
pub mod remote;
pub mod runner;
pub mod runtime;
pub mod session;
pub mod tools;
pub mod turn;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use agent::{Agent, AgentCell, AGENT_NAME};
pub use auth::{AuthorizedClient, CredentialResolver, CredentialSource};
pub use error::AgentError;
pub use providers::{GeminiProvider, LlmRequest, LlmResponse, ModelProvider};
pub use remote::RemoteAgentClient;
pub use runner::{EventStream, RunConfig, Runner, APP_NAME};
pub use runtime::{build_runner, connect};
pub use session::{InMemorySessionService, SessionService, VertexAiSessionService};
pub use tools::{Tool, ToolContext, ToolExecutor, ToolRegistry};
pub use turn::{ask, drain_turn, run_turn, TurnOutcome};

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
