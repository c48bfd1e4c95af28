//! The agent is built once per process and shared by every runner.

use salesassist_agent::{build_runner, AgentCell, CredentialResolver, AGENT_NAME};
use salesassist_core::Backend;
use salesassist_integration_tests::{sales_config, FakeConnector, FakeWarehouse, ScriptedProvider};
use std::sync::Arc;

fn resolver() -> Arc<CredentialResolver> {
    Arc::new(CredentialResolver::new(
        &sales_config(),
        Arc::new(FakeConnector::new(FakeWarehouse::default())),
    ))
}

#[tokio::test]
async fn test_concurrent_first_use_builds_one_agent() {
    let cell = Arc::new(AgentCell::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cell = cell.clone();
            tokio::spawn(async move { cell.get_or_create(&sales_config(), resolver()).await })
        })
        .collect();

    let mut agents = Vec::new();
    for handle in handles {
        agents.push(handle.await.unwrap());
    }

    let first = &agents[0];
    assert!(agents.iter().all(|a| Arc::ptr_eq(a, first)));
    assert_eq!(first.name, AGENT_NAME);
    assert_eq!(first.tools.list().await.len(), 3);
}

#[tokio::test]
async fn test_runners_share_the_agent() {
    let cell = AgentCell::new();
    let config = sales_config();

    let first = build_runner(
        &config,
        cell.get_or_create(&config, resolver()).await,
        Arc::new(ScriptedProvider::default()),
        None,
    )
    .unwrap();
    let second = build_runner(
        &config,
        cell.get_or_create(&config, resolver()).await,
        Arc::new(ScriptedProvider::default()),
        None,
    )
    .unwrap();

    assert!(Arc::ptr_eq(first.agent(), second.agent()));
}

#[tokio::test]
async fn test_local_backends_without_agent_engine() {
    let cell = AgentCell::new();
    let mut config = sales_config();
    config.use_agent_engine_memory = true;
    config.use_agent_engine_session = true;

    let runner = build_runner(
        &config,
        cell.get_or_create(&config, resolver()).await,
        Arc::new(ScriptedProvider::default()),
        None,
    )
    .unwrap();

    assert_eq!(runner.session_backend(), &Backend::Local);
    assert_eq!(runner.memory_backend(), &Backend::Local);
}
