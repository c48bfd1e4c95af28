//! End-to-end turns through the runner with in-process backends.

use futures::StreamExt;
use salesassist_agent::{ask, drain_turn, run_turn, AgentError, RunConfig, APP_NAME};
use salesassist_core::types::{Content, Event, MemoryScope, Role};
use salesassist_integration_tests::{call, row, transactions_schema, FakeWarehouse, Harness};
use serde_json::json;
use tokio_util::sync::CancellationToken;

const TOP_FIVE_SQL: &str = "SELECT customer_name, SUM(amount) AS revenue \
FROM `acme-sales.sales.transactions` GROUP BY customer_name ORDER BY revenue DESC LIMIT 5";

fn top_customers() -> FakeWarehouse {
    let customers = [
        ("Acme Corp", 125000.0),
        ("Globex", 98000.5),
        ("Initech", 87000.0),
        ("Umbrella", 64000.25),
        ("Hooli", 51000.0),
    ];
    FakeWarehouse::default()
        .with_tables(&["transactions"])
        .with_schema(transactions_schema())
        .with_rows(
            customers
                .iter()
                .map(|(name, revenue)| {
                    row(&[
                        ("customer_name", json!(name)),
                        ("revenue", json!(revenue)),
                    ])
                })
                .collect(),
        )
}

fn top_customers_script() -> Vec<Content> {
    vec![
        call(
            "get_table_schema",
            json!({"table_id": "acme-sales.sales.transactions"}),
        ),
        call("execute_sql", json!({"sql": TOP_FIVE_SQL})),
        Content::model_text(
            "Your top 5 customers by revenue are Acme Corp, Globex, Initech, Umbrella and Hooli.",
        ),
    ]
}

#[tokio::test]
async fn test_top_customers_by_revenue() {
    let harness = Harness::new(top_customers(), top_customers_script()).await;

    let outcome = drain_turn(
        run_turn(
            &harness.runner,
            "test-user-single-001",
            "test-session-single-001",
            "Show me the top 5 customers by revenue",
        ),
        &CancellationToken::new(),
        |_| {},
    )
    .await
    .unwrap();

    assert_eq!(
        outcome.text(),
        "Your top 5 customers by revenue are Acme Corp, Globex, Initech, Umbrella and Hooli."
    );
    // call, response, call, response, answer
    assert_eq!(outcome.events, 5);
    assert!(!outcome.cancelled);

    assert_eq!(harness.connector.warehouse().queries(), vec![TOP_FIVE_SQL]);

    let session = harness
        .runner
        .get_session("test-user-single-001", "test-session-single-001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.app_name, APP_NAME);
    assert_eq!(session.events.len(), 6);
    assert!(session.events[0].is_from_user());
    assert!(session.events[5].is_final_response());
}

#[tokio::test]
async fn test_tool_results_reach_the_model() {
    let harness = Harness::new(top_customers(), top_customers_script()).await;

    ask(&harness.runner, "u1", "s1", "Show me the top 5 customers by revenue")
        .await
        .unwrap();

    let requests = harness.model.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests
        .iter()
        .all(|r| r.system_instruction.as_deref().is_some_and(|s| s.contains("acme-sales.sales"))));

    let tool_names: Vec<String> = requests[0].tools.iter().map(|t| t.name.clone()).collect();
    assert_eq!(tool_names, vec!["execute_sql", "get_table_schema", "list_tables"]);

    // user, call, schema response, call, rows response
    let last = &requests[2].contents;
    assert_eq!(last.len(), 5);
    let schema_response = last[2].function_responses().next().unwrap();
    let schema_text = schema_response.response["result"].as_str().unwrap();
    assert!(schema_text.starts_with("Schema for acme-sales.sales.transactions:"));
    assert!(schema_text.contains("customer_name: STRING"));

    let rows_response = last[4].function_responses().next().unwrap();
    assert_eq!(rows_response.id.as_deref(), Some("call-execute_sql"));
    let rows_text = rows_response.response["result"].as_str().unwrap();
    let rows: serde_json::Value = serde_json::from_str(rows_text).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 5);
    assert_eq!(rows[0]["customer_name"], "Acme Corp");
}

#[tokio::test]
async fn test_unknown_tool_becomes_error_response() {
    let harness = Harness::new(
        FakeWarehouse::default(),
        vec![
            call("drop_table", json!({"table_id": "transactions"})),
            Content::model_text("I can't do that."),
        ],
    )
    .await;

    let events: Vec<Event> = run_turn(&harness.runner, "u1", "s1", "Delete the sales table")
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 3);
    let response_content = events[1].content.as_ref().unwrap();
    assert_eq!(response_content.role, Role::User);
    let response = response_content.function_responses().next().unwrap();
    assert_eq!(response.name, "drop_table");
    assert!(response.response.contains_key("error"));
    assert_eq!(events[2].text_fragments(), vec!["I can't do that."]);
}

#[tokio::test]
async fn test_model_call_limit_ends_the_turn() {
    let script = (0..5)
        .map(|_| call("list_tables", json!({})))
        .collect();
    let harness = Harness::new(
        FakeWarehouse::default().with_tables(&["transactions"]),
        script,
    )
    .await;
    let runner = harness
        .runner
        .with_run_config(RunConfig { max_llm_calls: 2 });

    let results: Vec<_> = run_turn(&runner, "u1", "s1", "Loop forever").collect().await;

    // two rounds of call + response, then the limit
    assert_eq!(results.len(), 5);
    assert!(results[..4].iter().all(Result::is_ok));
    assert!(matches!(
        results[4].as_ref().unwrap_err(),
        AgentError::LlmCallLimit(2)
    ));
}

#[tokio::test]
async fn test_conversation_continues_in_the_same_session() {
    let harness = Harness::new(
        top_customers(),
        vec![
            Content::model_text("Hello! Ask me about your sales."),
            Content::model_text("Acme Corp is your largest customer."),
        ],
    )
    .await;

    ask(&harness.runner, "u1", "s1", "Hi").await.unwrap();
    let answer = ask(&harness.runner, "u1", "s1", "Who is my largest customer?")
        .await
        .unwrap();
    assert_eq!(answer, "Acme Corp is your largest customer.");

    let requests = harness.model.requests();
    // second request carries the first exchange
    assert_eq!(requests[1].contents.len(), 3);
    assert_eq!(requests[1].contents[0].joined_text(), "Hi");
}

#[tokio::test]
async fn test_session_is_remembered_and_searchable() {
    let harness = Harness::new(
        top_customers(),
        vec![Content::model_text("Revenue peaked in March.")],
    )
    .await;

    ask(&harness.runner, "test-user-001", "test-session-001", "When did revenue peak?")
        .await
        .unwrap();
    harness
        .runner
        .add_session_to_memory("test-user-001", "test-session-001")
        .await
        .unwrap();

    assert_eq!(
        harness
            .memory
            .session_count(&MemoryScope::new(APP_NAME, "test-user-001"))
            .await,
        1
    );

    let found = harness
        .runner
        .search_memory("test-user-001", "revenue")
        .await
        .unwrap();
    assert!(!found.memories.is_empty());
    assert!(found
        .memories
        .iter()
        .any(|m| m.text() == "Revenue peaked in March."));

    let other_user = harness
        .runner
        .search_memory("someone-else", "revenue")
        .await
        .unwrap();
    assert!(other_user.memories.is_empty());
}

#[tokio::test]
async fn test_remembering_an_unknown_session_fails() {
    let harness = Harness::new(FakeWarehouse::default(), Vec::new()).await;

    let err = harness
        .runner
        .add_session_to_memory("u1", "never-started")
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::SessionNotFound(_)));
}
