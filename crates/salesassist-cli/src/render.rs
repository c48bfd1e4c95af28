//! Terminal rendering utilities.
//!
//! The conversation goes to stdout; banners, status and errors to stderr.

use console::style;
use salesassist_core::Backend;
use salesassist_memory::SearchMemoryResponse;
use std::fmt::Display;
use std::io::Write;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Print one streamed text fragment without a trailing newline.
pub fn render_fragment(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

/// Echo the user's message.
pub fn render_user_message(message: &str) {
    println!("{} {}", style("User:").bold(), message);
}

/// Label the agent's streamed answer.
pub fn render_agent_prefix() {
    print!("{} ", style("Agent:").bold().cyan());
    let _ = std::io::stdout().flush();
}

/// Note that a turn stopped early.
pub fn render_cancelled() {
    println!();
    eprintln!("{}", style("^C (turn cancelled)").dim());
}

/// Report a failed turn or command.
pub fn render_error(err: &dyn Display) {
    eprintln!("{}: {}", style("Error").red(), err);
}

/// Print memories found by `/recall`.
pub fn render_memories(query: &str, response: &SearchMemoryResponse) {
    if response.memories.is_empty() {
        eprintln!("{}", style(format!("No memories match '{}'.", query)).dim());
        return;
    }

    eprintln!("{}", style(format!("Memories matching '{}':", query)).bold());
    for entry in &response.memories {
        let author = entry.author.as_deref().unwrap_or("unknown");
        let when = entry
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        eprintln!(
            "  {} {} {}",
            style(author).cyan(),
            style(when).dim(),
            entry.text()
        );
    }
}

/// Print the current session and backend selection.
pub fn render_status(
    user_id: &str,
    session_id: &str,
    model: &str,
    sessions: &Backend,
    memory: &Backend,
) {
    eprintln!("  {} {}", style("user:").dim(), user_id);
    eprintln!("  {} {}", style("session:").dim(), session_id);
    eprintln!("  {} {}", style("model:").dim(), model);
    eprintln!("  {} {}", style("sessions:").dim(), sessions);
    eprintln!("  {} {}", style("memory:").dim(), memory);
}

/// Print the welcome banner for the REPL.
pub fn render_welcome(model: &str, user_id: &str, session_id: &str) {
    eprintln!(
        "{} {} {}",
        style("salesassist").bold().cyan(),
        style("interactive").dim(),
        style(format!("({})", model)).dim(),
    );
    eprintln!(
        "{}",
        style(format!("Session {} for user {}.", session_id, user_id)).dim()
    );
    eprintln!(
        "{}",
        style("Type /help for commands, 'exit' or 'quit' to leave.").dim()
    );
    eprintln!();
}

/// Print the help message.
pub fn render_help() {
    eprintln!("{}", style("Available commands:").bold());
    eprintln!("  {}           - Show this help", style("/help").cyan());
    eprintln!("  {}           - Exit the REPL", style("/quit").cyan());
    eprintln!("  {}         - Show session status", style("/status").cyan());
    eprintln!("  {} - Search long-term memory", style("/recall <query>").cyan());
    eprintln!();
    eprintln!("{}", style("Ctrl-C cancels the answer in progress.").dim());
    eprintln!();
}

/// Cancel `token` when Ctrl-C arrives. Abort the handle once the turn ends.
pub fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    })
}
