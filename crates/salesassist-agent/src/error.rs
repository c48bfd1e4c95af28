//! Agent error types.

use salesassist_cloud::CloudError;
use salesassist_core::ConfigError;
use salesassist_memory::MemoryError;
use thiserror::Error;

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Google Cloud call failed.
    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// Memory backend failed.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session already exists.
    #[error("Session already exists: {0}")]
    SessionExists(String),

    /// Tool not found.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool execution error.
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    /// Model API error.
    #[error("Model API error: {0}")]
    ModelApi(String),

    /// The model kept requesting tools past the per-turn limit.
    #[error("Model call limit exceeded: {0} calls in one turn")]
    LlmCallLimit(usize),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AgentError {
    /// Create a model API error.
    pub fn model_api(msg: impl Into<String>) -> Self {
        Self::ModelApi(msg.into())
    }

    /// Create a tool execution error.
    pub fn tool_execution(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error is retriable.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Cloud(e) => e.is_retryable(),
            _ => false,
        }
    }
}
