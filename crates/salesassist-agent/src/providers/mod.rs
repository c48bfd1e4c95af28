//! Model provider integrations.
//!
//! - [`GeminiProvider`] - Gemini models on Vertex AI

pub mod gemini;

use crate::Result;
use async_trait::async_trait;
use salesassist_core::types::{Content, TokenUsage, ToolDefinition};
use serde::{Deserialize, Serialize};

/// One model call: the instruction, the conversation so far, and the tools
/// the model may request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Model identifier.
    pub model: String,

    /// System instruction.
    pub system_instruction: Option<String>,

    /// Conversation contents in order.
    pub contents: Vec<Content>,

    /// Declared tools.
    pub tools: Vec<ToolDefinition>,
}

/// Response from a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated content, role `model`.
    pub content: Content,

    /// Token usage.
    pub usage: TokenUsage,

    /// Finish reason reported by the backend.
    pub finish_reason: Option<String>,
}

/// Trait for model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Get the current model.
    fn model(&self) -> &str;

    /// Generate a response (non-streaming).
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}

pub use gemini::GeminiProvider;
