//! Tool execution framework and the warehouse tools.
//!
//! This module provides:
//! - [`Tool`] trait for implementing tools
//! - [`ToolRegistry`] for managing available tools
//! - [`ToolExecutor`] for executing tools by name
//! - The BigQuery-backed data tools

mod bigquery;

pub use bigquery::{
    execute_sql, get_table_schema, list_tables, ExecuteSqlTool, GetTableSchemaTool,
    ListTablesTool,
};

use crate::error::AgentError;
use crate::Result;
use async_trait::async_trait;
use salesassist_core::types::{ToolDefinition, ToolResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::debug;

/// A tool that can be executed by an agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Get the tool definition for the model.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments.
    async fn execute(
        &self,
        tool_use_id: &str,
        args: Value,
        context: &ToolContext,
    ) -> Result<ToolResult>;
}

/// Per-invocation context handed to a tool.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Turn the call belongs to.
    pub invocation_id: String,

    /// Model function call being answered.
    pub function_call_id: String,

    /// Agent that requested the call.
    pub agent_name: String,

    /// End user.
    pub user_id: String,

    /// Session id.
    pub session_id: String,

    /// Snapshot of the session state.
    pub state: HashMap<String, Value>,
}

impl ToolContext {
    /// Context for a call within a session.
    pub fn new(
        invocation_id: impl Into<String>,
        agent_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            agent_name: agent_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// Set the function call id.
    pub fn with_function_call_id(mut self, id: impl Into<String>) -> Self {
        self.function_call_id = id.into();
        self
    }

    /// Set the state snapshot.
    pub fn with_state(mut self, state: HashMap<String, Value>) -> Self {
        self.state = state;
        self
    }

    /// Non-empty string stored under `key`.
    pub fn state_str(&self, key: &str) -> Option<&str> {
        self.state
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Read a required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::tool_execution(format!("Missing '{}' argument", name)))
}

/// Registry for available tools.
pub struct ToolRegistry {
    /// Registered tools by name.
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool, replacing any tool with the same name.
    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        let mut tools = self.tools.write().await;
        tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().await;
        tools.get(name).cloned()
    }

    /// List all tool names, sorted.
    pub async fn list(&self) -> Vec<String> {
        let tools = self.tools.read().await;
        let mut names: Vec<String> = tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get all tool definitions, sorted by name.
    pub async fn definitions(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        let mut defs: Vec<ToolDefinition> = tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

/// Executes registered tools by name.
pub struct ToolExecutor {
    /// Tool registry.
    registry: Arc<ToolRegistry>,

    /// Context used when the caller supplies none.
    default_context: ToolContext,
}

impl ToolExecutor {
    /// Create a new tool executor.
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            default_context: ToolContext::default(),
        }
    }

    /// The registry this executor dispatches into.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute a tool by name.
    pub async fn execute(
        &self,
        tool_use_id: &str,
        name: &str,
        args: Value,
        context: Option<&ToolContext>,
    ) -> Result<ToolResult> {
        let tool = self
            .registry
            .get(name)
            .await
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;

        let ctx = context.unwrap_or(&self.default_context);

        debug!("Executing tool '{}' with args: {}", name, args);
        let start = Instant::now();
        let result = tool.execute(tool_use_id, args, ctx).await?;
        Ok(result.with_duration(start.elapsed()))
    }
}
