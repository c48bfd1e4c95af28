//! Shared setup for the SalesAssist integration tests.
//!
//! The doubles come from `salesassist_agent::testing`; this crate adds the
//! sales fixtures and a runner wired to in-process backends.

use salesassist_agent::{Agent, CredentialResolver, InMemorySessionService, Runner};
use salesassist_cloud::Field;
use salesassist_core::types::Content;
use salesassist_core::Config;
use salesassist_memory::InMemoryMemoryService;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub use salesassist_agent::testing::{call, row, FakeConnector, FakeWarehouse, ScriptedProvider};

/// Session-state key the delegated token is read from.
pub const AUTH_ID: &str = "sales-auth";

/// Configuration for a sales project with no Agent Engine.
pub fn sales_config() -> Config {
    Config::from_lookup(|name| {
        let value = match name {
            "GOOGLE_CLOUD_PROJECT" => "acme-sales",
            "GOOGLE_CLOUD_LOCATION" => "us-central1",
            "BIGQUERY_TABLE_ID" => "acme-sales.sales.transactions",
            "BIGQUERY_LOCATION" => "US",
            "GEMINI_ENTERPRISE_AUTH_ID" => AUTH_ID,
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("complete test configuration")
}

/// The sales transactions schema.
pub fn transactions_schema() -> Vec<Field> {
    vec![
        Field::new("transaction_id", "STRING"),
        Field::new("customer_name", "STRING"),
        Field::new("amount", "FLOAT"),
        Field::new("transaction_date", "DATE"),
    ]
}

/// A runner wired to in-process backends and the given doubles.
pub struct Harness {
    pub runner: Runner,
    pub connector: Arc<FakeConnector>,
    pub model: Arc<ScriptedProvider>,
    pub memory: Arc<InMemoryMemoryService>,
}

impl Harness {
    pub async fn new(warehouse: FakeWarehouse, replies: Vec<Content>) -> Self {
        let config = sales_config();
        let connector = Arc::new(FakeConnector::new(warehouse));
        let resolver = Arc::new(CredentialResolver::new(&config, connector.clone()));
        let agent = Arc::new(Agent::sales_assistant(&config, resolver).await);
        let model = Arc::new(ScriptedProvider::new(replies));
        let memory = Arc::new(InMemoryMemoryService::new());

        let runner = Runner::new(
            agent,
            model.clone(),
            Arc::new(InMemorySessionService::new()),
            memory.clone(),
        );

        Self {
            runner,
            connector,
            model,
            memory,
        }
    }

    /// Create a session carrying a delegated token.
    pub async fn session_with_token(&self, user_id: &str, session_id: &str, token: &str) {
        let mut state = HashMap::new();
        state.insert(AUTH_ID.to_string(), Value::String(token.to_string()));
        self.runner
            .create_session(user_id, session_id, state)
            .await
            .expect("create session");
    }
}
