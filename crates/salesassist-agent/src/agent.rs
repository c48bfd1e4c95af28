//! Agent assembly.
//!
//! The agent is built once per process and shared. [`AgentCell`] is owned by
//! startup code and handed to whoever builds runners.

use crate::auth::CredentialResolver;
use crate::tools::{ExecuteSqlTool, GetTableSchemaTool, ListTablesTool, ToolRegistry};
use salesassist_core::Config;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

/// Agent name, also the author of model events.
pub const AGENT_NAME: &str = "sales_assist_agent";

/// Agent description.
pub const AGENT_DESCRIPTION: &str =
    "A helpful sales assistant that answers questions about sales transactions.";

/// A language agent: identity, instruction, model and tools.
pub struct Agent {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub model: String,
    pub tools: Arc<ToolRegistry>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Build the sales agent with its three data tools.
    pub async fn sales_assistant(config: &Config, resolver: Arc<CredentialResolver>) -> Self {
        let tools = Arc::new(ToolRegistry::new());
        tools.register(Arc::new(ListTablesTool::new(resolver.clone()))).await;
        tools.register(Arc::new(GetTableSchemaTool::new(resolver.clone()))).await;
        tools.register(Arc::new(ExecuteSqlTool::new(resolver))).await;

        Self {
            name: AGENT_NAME.to_string(),
            description: AGENT_DESCRIPTION.to_string(),
            instruction: instruction(config),
            model: config.model.clone(),
            tools,
        }
    }
}

/// System instruction for the sales agent.
pub fn instruction(config: &Config) -> String {
    format!(
        "You are a knowledgeable Sales Assistant for the `{project}` project. Your goal is to \
answer user questions about sales transactions using BigQuery data.

Workflow Guidelines:
1. **Discovery**: If you are unsure which tables exist, list the tables in the default dataset \
`{dataset}` using `list_tables`.
2. **Schema Inspection**: You MUST inspect a table's schema with `get_table_schema` before \
writing any SQL against it, so you use the exact column names and types.
3. **Data Retrieval**: Run GoogleSQL queries with `execute_sql` to fetch the data needed.
4. **Natural Response**: Answer in clear, customer-friendly language. If a query returns no \
data, say so and explain what you looked for.

Important Rules:
- The default table is `{table}`.
- ALWAYS check the schema before querying a table for the first time in a session.
- Do not make up data. Only report what the queries return.",
        project = config.project_id,
        dataset = config.default_dataset_id(),
        table = config.bigquery_table_id,
    )
}

/// Write-once holder for the process agent.
#[derive(Default)]
pub struct AgentCell {
    cell: OnceCell<Arc<Agent>>,
}

impl AgentCell {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// The agent, building it on first use.
    ///
    /// Concurrent first calls build it once; every caller gets the same `Arc`.
    pub async fn get_or_create(
        &self,
        config: &Config,
        resolver: Arc<CredentialResolver>,
    ) -> Arc<Agent> {
        self.cell
            .get_or_init(|| async move {
                info!("Creating agent {} with model {}", AGENT_NAME, config.model);
                Arc::new(Agent::sales_assistant(config, resolver).await)
            })
            .await
            .clone()
    }

    /// The agent, if already built.
    pub fn get(&self) -> Option<Arc<Agent>> {
        self.cell.get().cloned()
    }
}
