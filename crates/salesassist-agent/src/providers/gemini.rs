//! Gemini on Vertex AI.
//!
//! Calls `generateContent` on the publisher model with the agent's system
//! instruction, the session contents and the declared tools.

use super::{LlmRequest, LlmResponse, ModelProvider};
use crate::error::AgentError;
use crate::Result;
use async_trait::async_trait;
use salesassist_cloud::VertexClient;
use salesassist_core::id;
use salesassist_core::types::{
    Content, FunctionCall, Part, Role, TokenUsage, ToolDefinition,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Gemini provider backed by a Vertex AI client.
pub struct GeminiProvider {
    /// Authorized Vertex AI client.
    client: VertexClient,

    /// Model used for every request.
    model: String,
}

impl GeminiProvider {
    /// Create a provider for `model`.
    pub fn new(client: VertexClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Convert contents to Gemini format.
    fn convert_contents(&self, contents: &[Content]) -> Vec<GeminiContent> {
        contents
            .iter()
            .filter(|c| !c.parts.is_empty())
            .map(|content| GeminiContent {
                role: match content.role {
                    Role::User => "user".to_string(),
                    Role::Model => "model".to_string(),
                },
                parts: content.parts.iter().map(convert_part).collect(),
            })
            .collect()
    }

    /// Convert tools to Gemini format.
    fn convert_tools(&self, tools: &[ToolDefinition]) -> Option<Vec<GeminiTool>> {
        if tools.is_empty() {
            return None;
        }
        Some(vec![GeminiTool {
            function_declarations: tools
                .iter()
                .map(|t| GeminiFunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                })
                .collect(),
        }])
    }

    /// Parse Gemini response.
    fn parse_response(&self, response: GeminiResponse) -> Result<LlmResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::model_api("No candidates in response"))?;

        let mut parts = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            match part {
                GeminiPart::Text { text } => {
                    if !text.is_empty() {
                        parts.push(Part::Text(text));
                    }
                }
                GeminiPart::FunctionCall { function_call } => {
                    parts.push(Part::FunctionCall(FunctionCall {
                        id: Some(id::function_call_id()),
                        name: function_call.name,
                        args: function_call.args,
                    }));
                }
                GeminiPart::FunctionResponse { .. } => {}
            }
        }

        let usage = response.usage_metadata.unwrap_or_default();

        Ok(LlmResponse {
            content: Content::new(Role::Model, parts),
            usage: TokenUsage {
                input: usage.prompt_token_count,
                output: usage.candidates_token_count,
            },
            finish_reason: candidate.finish_reason,
        })
    }
}

fn convert_part(part: &Part) -> GeminiPart {
    match part {
        Part::Text(text) => GeminiPart::Text { text: text.clone() },
        Part::FunctionCall(call) => GeminiPart::FunctionCall {
            function_call: GeminiFunctionCall {
                name: call.name.clone(),
                args: call.args.clone(),
            },
        },
        Part::FunctionResponse(resp) => GeminiPart::FunctionResponse {
            function_response: GeminiFunctionResponse {
                name: resp.name.clone(),
                response: resp.response.clone(),
            },
        },
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &str {
        "vertex-gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };

        let body = GeminiRequest {
            contents: self.convert_contents(&request.contents),
            system_instruction: request.system_instruction.as_ref().map(|text| {
                GeminiSystemInstruction {
                    parts: vec![GeminiPart::Text { text: text.clone() }],
                }
            }),
            tools: self.convert_tools(&request.tools),
        };

        debug!(
            "Sending request to Gemini: model={}, contents={}",
            model,
            body.contents.len()
        );

        let resource = format!("{}:generateContent", self.client.model_resource(model));
        let response: GeminiResponse = self.client.post(&resource, &[], &body).await?;
        self.parse_response(response)
    }
}

// Internal types for the Gemini API

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
}

#[derive(Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Map<String, Value>,
}

#[derive(Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}
