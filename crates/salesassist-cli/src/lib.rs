//! SalesAssist command-line interface.

pub mod commands;
pub mod render;
pub mod repl;

use clap::{Parser, Subcommand};

/// SalesAssist - conversational sales analytics over BigQuery
#[derive(Parser)]
#[command(name = "salesassist")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session
    Chat(commands::chat::ChatArgs),

    /// Ask a single question and print the answer
    Query(commands::query::QueryArgs),

    /// Ask an agent deployed to Vertex AI Agent Engine
    Remote(commands::remote::RemoteArgs),

    /// Run diagnostics
    Doctor,

    /// Show the resolved configuration
    Config,

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Chat(args) => commands::chat::run(args).await,
        Commands::Query(args) => commands::query::run(args).await,
        Commands::Remote(args) => commands::remote::run(args).await,
        Commands::Doctor => commands::doctor::run().await,
        Commands::Config => commands::config::run(),
        Commands::Version => {
            println!("salesassist {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
