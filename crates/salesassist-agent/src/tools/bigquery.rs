//! BigQuery data tools.
//!
//! Each tool resolves a fresh client, performs one warehouse call and turns
//! the outcome into text. Failures become text too, so the model can read
//! them and adjust its next step.

use super::{required_str, Tool, ToolContext};
use crate::auth::CredentialResolver;
use crate::Result;
use async_trait::async_trait;
use salesassist_cloud::{CloudError, Row, TableSchema};
use salesassist_core::types::{ToolDefinition, ToolResult};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// List the tables of a dataset.
pub async fn list_tables(
    resolver: &CredentialResolver,
    dataset_id: &str,
    context: Option<&ToolContext>,
) -> String {
    match try_list_tables(resolver, dataset_id, context).await {
        Ok(tables) if tables.is_empty() => format!("No tables found in dataset {}.", dataset_id),
        Ok(tables) => format!("Tables in {}: {}", dataset_id, tables.join(", ")),
        Err(e) => {
            warn!("Listing tables in {} failed: {}", dataset_id, e);
            format!("Error listing tables: {}", e)
        }
    }
}

async fn try_list_tables(
    resolver: &CredentialResolver,
    dataset_id: &str,
    context: Option<&ToolContext>,
) -> std::result::Result<Vec<String>, CloudError> {
    let authorized = resolver.resolve(context).await?;
    authorized.client.list_tables(dataset_id).await
}

/// Describe a table's columns, one `name: TYPE` line each.
pub async fn get_table_schema(
    resolver: &CredentialResolver,
    table_id: &str,
    context: Option<&ToolContext>,
) -> String {
    match try_get_table(resolver, table_id, context).await {
        Ok(schema) => format_schema(table_id, &schema),
        Err(e) => {
            warn!("Fetching schema of {} failed: {}", table_id, e);
            format!("Error getting table schema: {}", e)
        }
    }
}

async fn try_get_table(
    resolver: &CredentialResolver,
    table_id: &str,
    context: Option<&ToolContext>,
) -> std::result::Result<TableSchema, CloudError> {
    let authorized = resolver.resolve(context).await?;
    authorized.client.get_table(table_id).await
}

fn format_schema(table_id: &str, schema: &TableSchema) -> String {
    std::iter::once(format!("Schema for {}:", table_id))
        .chain(
            schema
                .fields
                .iter()
                .map(|field| format!("{}: {}", field.name, field.field_type)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run a query and render its rows.
pub async fn execute_sql(
    resolver: &CredentialResolver,
    sql: &str,
    context: Option<&ToolContext>,
) -> String {
    match try_query(resolver, sql, context).await {
        Ok(rows) if rows.is_empty() => "No results found.".to_string(),
        Ok(rows) => {
            debug!("Query returned {} rows", rows.len());
            render_rows(&rows)
        }
        Err(e) => {
            error!("Query failed: {}", e);
            format!("Error executing query: {}", e)
        }
    }
}

async fn try_query(
    resolver: &CredentialResolver,
    sql: &str,
    context: Option<&ToolContext>,
) -> std::result::Result<Vec<Row>, CloudError> {
    let authorized = resolver.resolve(context).await?;
    authorized.client.query(sql).await
}

fn render_rows(rows: &[Row]) -> String {
    Value::Array(rows.iter().cloned().map(Value::Object).collect()).to_string()
}

/// `list_tables` as a model-callable tool.
pub struct ListTablesTool {
    resolver: Arc<CredentialResolver>,
}

impl ListTablesTool {
    /// Create the tool.
    pub fn new(resolver: Arc<CredentialResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for ListTablesTool {
    fn name(&self) -> &str {
        "list_tables"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "list_tables",
            "Lists all available tables in a specific BigQuery dataset. Use this tool if the \
             user's request is ambiguous or you need to discover which tables exist before \
             querying.",
            json!({
                "type": "object",
                "properties": {
                    "dataset_id": {
                        "type": "string",
                        "description": "The full ID of the dataset (e.g., 'project.dataset_id')."
                    }
                },
                "required": ["dataset_id"]
            }),
        )
    }

    async fn execute(
        &self,
        tool_use_id: &str,
        args: Value,
        context: &ToolContext,
    ) -> Result<ToolResult> {
        let dataset_id = required_str(&args, "dataset_id")?;
        let text = list_tables(&self.resolver, dataset_id, Some(context)).await;
        Ok(ToolResult::text(tool_use_id, text))
    }
}

/// `get_table_schema` as a model-callable tool.
pub struct GetTableSchemaTool {
    resolver: Arc<CredentialResolver>,
}

impl GetTableSchemaTool {
    /// Create the tool.
    pub fn new(resolver: Arc<CredentialResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for GetTableSchemaTool {
    fn name(&self) -> &str {
        "get_table_schema"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_table_schema",
            "Retrieves the detailed schema (field names and data types) of a BigQuery table. \
             ALWAYS use this tool before writing a SQL query against a table for the first \
             time, to learn the exact column names.",
            json!({
                "type": "object",
                "properties": {
                    "table_id": {
                        "type": "string",
                        "description": "The full ID of the table (e.g., 'project.dataset.table_id')."
                    }
                },
                "required": ["table_id"]
            }),
        )
    }

    async fn execute(
        &self,
        tool_use_id: &str,
        args: Value,
        context: &ToolContext,
    ) -> Result<ToolResult> {
        let table_id = required_str(&args, "table_id")?;
        let text = get_table_schema(&self.resolver, table_id, Some(context)).await;
        Ok(ToolResult::text(tool_use_id, text))
    }
}

/// `execute_sql` as a model-callable tool.
pub struct ExecuteSqlTool {
    resolver: Arc<CredentialResolver>,
}

impl ExecuteSqlTool {
    /// Create the tool.
    pub fn new(resolver: Arc<CredentialResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for ExecuteSqlTool {
    fn name(&self) -> &str {
        "execute_sql"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "execute_sql",
            "Executes a standard SQL query in BigQuery. Use this tool ONLY after you know the \
             table schema and column names. Returns the result rows.",
            json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "The valid GoogleSQL query to execute."
                    }
                },
                "required": ["sql"]
            }),
        )
    }

    async fn execute(
        &self,
        tool_use_id: &str,
        args: Value,
        context: &ToolContext,
    ) -> Result<ToolResult> {
        let sql = required_str(&args, "sql")?;
        let text = execute_sql(&self.resolver, sql, Some(context)).await;
        Ok(ToolResult::text(tool_use_id, text))
    }
}
