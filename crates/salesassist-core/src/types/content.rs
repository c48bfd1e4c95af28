//! Conversation content: roles and parts.
//!
//! The serialized shape matches the Vertex AI `Content` resource, so the same
//! values travel to the model, to remote sessions, and to local storage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who produced a piece of content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user, or tool responses sent back to the model.
    #[default]
    User,

    /// The language model.
    Model,
}

/// A role plus an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// Create content from parts.
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// A single user text message.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    /// A single model text message.
    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    /// Text parts in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(Part::as_text)
    }

    /// All text parts joined without separators.
    pub fn joined_text(&self) -> String {
        self.texts().collect()
    }

    /// Function calls in order.
    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.parts.iter().filter_map(|p| match p {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        })
    }

    /// Function responses in order.
    pub fn function_responses(&self) -> impl Iterator<Item = &FunctionResponse> {
        self.parts.iter().filter_map(|p| match p {
            Part::FunctionResponse(resp) => Some(resp),
            _ => None,
        })
    }
}

/// One unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Borrow the text, if this is a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A model request to invoke a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub args: Map<String, Value>,
}

/// The outcome of a tool invocation, returned to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    pub response: Map<String, Value>,
}

impl FunctionResponse {
    /// Wrap a tool output under the `result` key.
    pub fn result(id: Option<String>, name: impl Into<String>, output: Value) -> Self {
        let mut response = Map::new();
        response.insert("result".to_string(), output);
        Self {
            id,
            name: name.into(),
            response,
        }
    }

    /// Wrap an error message under the `error` key.
    pub fn error(id: Option<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut response = Map::new();
        response.insert("error".to_string(), Value::String(message.into()));
        Self {
            id,
            name: name.into(),
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_part_wire_shape() {
        let content = Content::new(
            Role::Model,
            vec![
                Part::text("Let me check."),
                Part::FunctionCall(FunctionCall {
                    id: None,
                    name: "list_tables".to_string(),
                    args: json!({"dataset_id": "acme.sales"})
                        .as_object()
                        .cloned()
                        .unwrap(),
                }),
            ],
        );

        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(
            value,
            json!({
                "role": "model",
                "parts": [
                    {"text": "Let me check."},
                    {"functionCall": {"name": "list_tables", "args": {"dataset_id": "acme.sales"}}}
                ]
            })
        );
    }

    #[test]
    fn test_parse_function_response() {
        let value = json!({
            "role": "user",
            "parts": [{"functionResponse": {"id": "c1", "name": "execute_sql", "response": {"result": "No results found."}}}]
        });
        let content: Content = serde_json::from_value(value).unwrap();
        let resp = content.function_responses().next().unwrap();
        assert_eq!(resp.id.as_deref(), Some("c1"));
        assert_eq!(resp.response["result"], "No results found.");
        assert_eq!(content.texts().count(), 0);
    }

    #[test]
    fn test_joined_text_skips_other_parts() {
        let content = Content::new(
            Role::Model,
            vec![
                Part::text("Top "),
                Part::FunctionResponse(FunctionResponse::error(None, "x", "boom")),
                Part::text("customers"),
            ],
        );
        assert_eq!(content.joined_text(), "Top customers");
    }
}
