//! Questions to an agent deployed on Vertex AI Agent Engine.

use super::{load_config, DEFAULT_USER};
use crate::render;
use anyhow::Context;
use clap::Args;
use salesassist_agent::{drain_turn, RemoteAgentClient};
use salesassist_cloud::{Credentials, VertexClient};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Remote command arguments.
#[derive(Args)]
pub struct RemoteArgs {
    /// Question to ask
    #[arg(default_value = "What is the schema of the sales transactions table?")]
    pub question: String,

    /// User id to query as
    #[arg(long, default_value = DEFAULT_USER)]
    pub user: String,
}

/// Run the remote command.
pub async fn run(args: RemoteArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let Some(engine_id) = config.agent_engine_id.as_deref() else {
        anyhow::bail!("AGENT_ENGINE_ID is not set; deploy the agent first");
    };

    let http = reqwest::Client::new();
    let credentials = Credentials::application_default(&http)
        .await
        .context("Failed to resolve application default credentials")?;
    let vertex = VertexClient::new(http, credentials, &config.project_id, &config.location);
    let client = RemoteAgentClient::new(vertex, engine_id);
    info!("Querying deployed agent {}", client.engine());

    render::render_user_message(&args.question);
    render::render_agent_prefix();

    let cancel = CancellationToken::new();
    let watcher = render::cancel_on_ctrl_c(cancel.clone());
    let result = drain_turn(
        client.stream_query(&args.user, &args.question),
        &cancel,
        render::render_fragment,
    )
    .await;
    watcher.abort();

    let outcome = result?;
    if outcome.cancelled {
        render::render_cancelled();
    } else {
        println!();
    }
    Ok(())
}
