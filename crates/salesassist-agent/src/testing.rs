//! Test doubles for the agent runtime.
//!
//! Compiled for this crate's unit tests and, with the `test-util` feature,
//! for downstream integration tests. Nothing here talks to Google Cloud.

use crate::providers::{LlmRequest, LlmResponse, ModelProvider};
use crate::Result;
use async_trait::async_trait;
use salesassist_cloud::{
    ClientScope, CloudError, Field, Row, TableSchema, WarehouseClient, WarehouseConnector,
};
use salesassist_core::types::{Content, FunctionCall, Part, Role, TokenUsage};
use salesassist_core::Config;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A local-backend configuration with no delegated token key.
pub fn config() -> Config {
    Config {
        project_id: "acme-sales".to_string(),
        location: "us-central1".to_string(),
        bigquery_table_id: "acme-sales.sales.transactions".to_string(),
        bigquery_location: "US".to_string(),
        model: "gemini-2.0-flash".to_string(),
        agent_engine_id: None,
        use_agent_engine_memory: false,
        use_agent_engine_session: false,
        enterprise_auth_id: None,
    }
}

/// One result row from name/value pairs.
pub fn row(pairs: &[(&str, Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Canned warehouse answers.
#[derive(Default)]
pub struct FakeWarehouse {
    tables: Vec<String>,
    schema: Vec<Field>,
    rows: Vec<Row>,
    failure: Option<String>,
    queries: Mutex<Vec<String>>,
}

impl FakeWarehouse {
    pub fn with_tables(mut self, tables: &[&str]) -> Self {
        self.tables = tables.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_schema(mut self, fields: Vec<Field>) -> Self {
        self.schema = fields;
        self
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// SQL received, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn check(&self) -> std::result::Result<(), CloudError> {
        match &self.failure {
            Some(message) => Err(CloudError::InvalidRequest(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WarehouseClient for FakeWarehouse {
    async fn list_tables(&self, _dataset_id: &str) -> salesassist_cloud::Result<Vec<String>> {
        self.check()?;
        Ok(self.tables.clone())
    }

    async fn get_table(&self, _table_id: &str) -> salesassist_cloud::Result<TableSchema> {
        self.check()?;
        Ok(TableSchema {
            fields: self.schema.clone(),
        })
    }

    async fn query(&self, sql: &str) -> salesassist_cloud::Result<Vec<Row>> {
        self.queries.lock().unwrap().push(sql.to_string());
        self.check()?;
        Ok(self.rows.clone())
    }
}

/// One client construction seen by [`FakeConnector`].
#[derive(Debug, Clone)]
pub struct ConnectCall {
    pub token: Option<String>,
    pub scope: ClientScope,
}

/// Records which credential path was taken.
pub struct FakeConnector {
    warehouse: Arc<FakeWarehouse>,
    calls: Mutex<Vec<ConnectCall>>,
    failure: Mutex<Option<String>>,
}

impl FakeConnector {
    pub fn new(warehouse: FakeWarehouse) -> Self {
        Self {
            warehouse: Arc::new(warehouse),
            calls: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<ConnectCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Tokens presented, in order; `None` means default credentials.
    pub fn tokens(&self) -> Vec<Option<String>> {
        self.calls().into_iter().map(|call| call.token).collect()
    }

    pub fn scopes(&self) -> Vec<ClientScope> {
        self.calls().into_iter().map(|call| call.scope).collect()
    }

    pub fn warehouse(&self) -> &FakeWarehouse {
        &self.warehouse
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    fn connect(
        &self,
        token: Option<&str>,
        scope: ClientScope,
    ) -> salesassist_cloud::Result<Arc<dyn WarehouseClient>> {
        self.calls.lock().unwrap().push(ConnectCall {
            token: token.map(str::to_string),
            scope,
        });
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(CloudError::auth(message));
        }
        Ok(self.warehouse.clone())
    }
}

#[async_trait]
impl WarehouseConnector for FakeConnector {
    async fn with_token(
        &self,
        token: &str,
        scope: ClientScope,
    ) -> salesassist_cloud::Result<Arc<dyn WarehouseClient>> {
        self.connect(Some(token), scope)
    }

    async fn with_default_credentials(
        &self,
        scope: ClientScope,
    ) -> salesassist_cloud::Result<Arc<dyn WarehouseClient>> {
        self.connect(None, scope)
    }
}

/// Replays model replies in order; answers "Done." once exhausted.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Content>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Content>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Model content requesting one tool call.
pub fn call(name: &str, args: Value) -> Content {
    Content::new(
        Role::Model,
        vec![Part::FunctionCall(FunctionCall {
            id: Some(format!("call-{}", name)),
            name: name.to_string(),
            args: args.as_object().cloned().unwrap_or_default(),
        })],
    )
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(request);
        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Content::model_text("Done."));
        Ok(LlmResponse {
            content,
            usage: TokenUsage { input: 10, output: 5 },
            finish_reason: Some("STOP".to_string()),
        })
    }
}
