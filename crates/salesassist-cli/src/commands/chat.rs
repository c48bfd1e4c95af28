//! Interactive chat command.

use super::{connect, load_config, DEFAULT_USER};
use crate::repl::{Repl, ReplConfig};
use clap::Args;

/// Chat command arguments.
#[derive(Args)]
pub struct ChatArgs {
    /// User id owning the session
    #[arg(long, default_value = DEFAULT_USER)]
    pub user: String,

    /// Session id to create or resume
    #[arg(long, default_value = "test-session-001")]
    pub session: String,
}

/// Run the chat command.
pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let config = load_config()?;
    let runner = connect(&config).await?;

    let mut repl = Repl::new(runner, args.user, args.session, ReplConfig::default());
    repl.run().await
}
