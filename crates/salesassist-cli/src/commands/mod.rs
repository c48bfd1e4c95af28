//! CLI command implementations.

pub mod chat;
pub mod config;
pub mod doctor;
pub mod query;
pub mod remote;

use anyhow::Context;
use salesassist_agent::{AgentCell, Runner};
use salesassist_core::Config;

/// Default user for local sessions.
pub const DEFAULT_USER: &str = "test-user-001";

/// Load configuration from the environment (and `.env`).
pub(crate) fn load_config() -> anyhow::Result<Config> {
    Config::from_env().context("Failed to load configuration from the environment")
}

/// Build the production runner for `config`.
pub(crate) async fn connect(config: &Config) -> anyhow::Result<Runner> {
    let http = reqwest::Client::new();
    let cell = AgentCell::new();
    salesassist_agent::connect(config, &cell, &http)
        .await
        .context("Failed to initialize the agent runtime")
}
