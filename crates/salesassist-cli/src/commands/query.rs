//! Single-question command.

use super::{connect, load_config};
use crate::render;
use clap::Args;
use salesassist_agent::{drain_turn, run_turn};
use tokio_util::sync::CancellationToken;

/// Query command arguments.
#[derive(Args)]
pub struct QueryArgs {
    /// Question to ask
    #[arg(default_value = "Show me the top 5 customers by revenue")]
    pub message: String,

    /// User id owning the session
    #[arg(long, default_value = "test-user-single-001")]
    pub user: String,

    /// Session id for the turn
    #[arg(long, default_value = "test-session-single-001")]
    pub session: String,
}

/// Run the query command.
pub async fn run(args: QueryArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let runner = connect(&config).await?;

    render::render_user_message(&args.message);
    render::render_agent_prefix();

    let cancel = CancellationToken::new();
    let watcher = render::cancel_on_ctrl_c(cancel.clone());
    let stream = run_turn(&runner, &args.user, &args.session, &args.message);
    let result = drain_turn(stream, &cancel, render::render_fragment).await;
    watcher.abort();

    let outcome = result?;
    if outcome.cancelled {
        render::render_cancelled();
    } else {
        println!();
    }
    Ok(())
}
