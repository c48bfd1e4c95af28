//! Which credentials a turn's warehouse calls run under.

use salesassist_agent::ask;
use salesassist_cloud::ClientScope;
use salesassist_core::types::Content;
use salesassist_integration_tests::{call, transactions_schema, FakeWarehouse, Harness};
use serde_json::{json, Value};
use std::collections::HashMap;

fn warehouse() -> FakeWarehouse {
    FakeWarehouse::default()
        .with_tables(&["transactions", "customers"])
        .with_schema(transactions_schema())
}

fn list_then_answer() -> Vec<Content> {
    vec![
        call("list_tables", json!({"dataset_id": "acme-sales.sales"})),
        Content::model_text("There are two tables."),
    ]
}

#[tokio::test]
async fn test_delegated_token_is_used_verbatim() {
    let harness = Harness::new(warehouse(), list_then_answer()).await;
    harness
        .session_with_token("alice", "s1", "ya29.delegated-alice")
        .await;

    ask(&harness.runner, "alice", "s1", "Which tables exist?")
        .await
        .unwrap();

    assert_eq!(
        harness.connector.tokens(),
        vec![Some("ya29.delegated-alice".to_string())]
    );
    assert_eq!(
        harness.connector.scopes(),
        vec![ClientScope::new("acme-sales", "US")]
    );
}

#[tokio::test]
async fn test_default_credentials_without_token() {
    let harness = Harness::new(warehouse(), list_then_answer()).await;

    ask(&harness.runner, "bob", "s1", "Which tables exist?")
        .await
        .unwrap();

    assert_eq!(harness.connector.tokens(), vec![None]);
}

#[tokio::test]
async fn test_token_under_another_key_is_ignored() {
    let harness = Harness::new(warehouse(), list_then_answer()).await;
    let mut state = HashMap::new();
    state.insert("unrelated".to_string(), Value::from("ya29.not-for-bigquery"));
    harness
        .runner
        .create_session("carol", "s1", state)
        .await
        .unwrap();

    ask(&harness.runner, "carol", "s1", "Which tables exist?")
        .await
        .unwrap();

    assert_eq!(harness.connector.tokens(), vec![None]);
}

#[tokio::test]
async fn test_credentials_resolved_per_call() {
    let harness = Harness::new(
        warehouse(),
        vec![
            call("list_tables", json!({"dataset_id": "sales"})),
            call(
                "get_table_schema",
                json!({"table_id": "acme-sales.sales.transactions"}),
            ),
            Content::model_text("The transactions table has four columns."),
        ],
    )
    .await;
    harness.session_with_token("dave", "s1", "ya29.dave").await;

    ask(&harness.runner, "dave", "s1", "Describe the sales data")
        .await
        .unwrap();

    assert_eq!(
        harness.connector.tokens(),
        vec![Some("ya29.dave".to_string()), Some("ya29.dave".to_string())]
    );
}

#[tokio::test]
async fn test_sessions_do_not_share_tokens() {
    let harness = Harness::new(
        warehouse(),
        vec![
            call("list_tables", json!({"dataset_id": "sales"})),
            Content::model_text("Two tables."),
            call("list_tables", json!({"dataset_id": "sales"})),
            Content::model_text("Two tables."),
        ],
    )
    .await;
    harness.session_with_token("erin", "with-token", "ya29.erin").await;

    ask(&harness.runner, "erin", "with-token", "Tables?")
        .await
        .unwrap();
    ask(&harness.runner, "erin", "without-token", "Tables?")
        .await
        .unwrap();

    assert_eq!(
        harness.connector.tokens(),
        vec![Some("ya29.erin".to_string()), None]
    );
}
