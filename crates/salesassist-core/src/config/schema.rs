//! Configuration record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default language model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Process-wide SalesAssist configuration.
///
/// Built once at startup from the environment and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Google Cloud project id.
    pub project_id: String,

    /// Vertex AI region.
    pub location: String,

    /// Default table (`project.dataset.table`).
    pub bigquery_table_id: String,

    /// BigQuery job location. Defaults to `location`.
    pub bigquery_location: String,

    /// Model identifier.
    pub model: String,

    /// Vertex AI Agent Engine id, if deployed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_engine_id: Option<String>,

    /// Store long-term memory in the Agent Engine memory bank.
    #[serde(default)]
    pub use_agent_engine_memory: bool,

    /// Store sessions in Agent Engine sessions.
    #[serde(default)]
    pub use_agent_engine_session: bool,

    /// Session-state key holding a delegated OAuth token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise_auth_id: Option<String>,
}

impl Config {
    /// Default dataset id: the table id with its last `.segment` removed.
    pub fn default_dataset_id(&self) -> &str {
        match self.bigquery_table_id.rsplit_once('.') {
            Some((dataset, _)) => dataset,
            None => &self.bigquery_table_id,
        }
    }

    /// Memory storage selected by configuration.
    pub fn memory_backend(&self) -> Backend {
        Backend::select(self.use_agent_engine_memory, self.agent_engine_id.as_deref())
    }

    /// Session storage selected by configuration.
    pub fn session_backend(&self) -> Backend {
        Backend::select(self.use_agent_engine_session, self.agent_engine_id.as_deref())
    }
}

/// Where sessions or memories live.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Backend {
    /// In-process store, lost on exit.
    Local,

    /// Vertex AI Agent Engine managed store.
    Remote { engine_id: String },
}

impl Backend {
    /// Remote only when the flag is set and an engine id is present.
    pub fn select(enabled: bool, engine_id: Option<&str>) -> Self {
        match engine_id {
            Some(id) if enabled && !id.is_empty() => Self::Remote {
                engine_id: id.to_string(),
            },
            _ => Self::Local,
        }
    }

    /// Check if this is the remote backend.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "in-memory"),
            Self::Remote { engine_id } => write!(f, "agent-engine:{}", engine_id),
        }
    }
}
