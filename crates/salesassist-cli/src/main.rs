//! SalesAssist CLI entry point.

use clap::Parser;
use salesassist_cli::{run, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "salesassist=info",
        1 => "salesassist=debug",
        _ => "salesassist=trace",
    };

    // stdout carries the conversation; logs go to stderr
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    run(cli).await
}
