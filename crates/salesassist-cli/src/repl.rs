//! Interactive read-eval-print loop.
//!
//! Provides `salesassist chat`: an interactive session with rustyline line
//! editing and streamed answers. Ctrl-C during an answer cancels that turn
//! only; the session is handed to long-term memory on exit.

use crate::render;
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, EditMode, Editor, Helper};
use salesassist_agent::{drain_turn, run_turn, AgentError, Runner};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const COMMANDS: &[&str] = &["/help", "/quit", "/exit", "/status", "/recall"];

/// REPL configuration.
pub struct ReplConfig {
    /// Path to history file.
    pub history_file: PathBuf,
    /// Maximum history entries.
    pub max_history: usize,
    /// Hand the session to long-term memory when the REPL exits.
    pub remember_on_exit: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        let history_file = salesassist_core::paths::history_file()
            .unwrap_or_else(|_| PathBuf::from(".salesassist_history"));

        Self {
            history_file,
            max_history: 1000,
            remember_on_exit: true,
        }
    }
}

/// Tab-completion helper for slash commands.
struct ReplHelper {
    hinter: HistoryHinter,
}

impl Completer for ReplHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok((0, complete_command(&line[..pos])))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &rustyline::Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}

fn complete_command(prefix: &str) -> Vec<String> {
    if !prefix.starts_with('/') {
        return Vec::new();
    }
    COMMANDS
        .iter()
        .filter(|c| c.starts_with(prefix))
        .map(|c| c.to_string())
        .collect()
}

/// What the user typed, once classified.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Quit,
    Command(&'a str),
    Message(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Empty
    } else if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        Input::Quit
    } else if trimmed.starts_with('/') {
        Input::Command(trimmed)
    } else {
        Input::Message(trimmed)
    }
}

/// The interactive REPL.
pub struct Repl {
    runner: Runner,
    user_id: String,
    session_id: String,
    config: ReplConfig,
}

impl Repl {
    /// Create a new REPL instance.
    pub fn new(runner: Runner, user_id: String, session_id: String, config: ReplConfig) -> Self {
        Self {
            runner,
            user_id,
            session_id,
            config,
        }
    }

    /// Run the REPL loop.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        render::render_welcome(&self.runner.agent().model, &self.user_id, &self.session_id);

        let rl_config = Config::builder()
            .max_history_size(self.config.max_history)?
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .build();

        let mut rl: Editor<ReplHelper, FileHistory> = Editor::with_config(rl_config)?;
        rl.set_helper(Some(ReplHelper {
            hinter: HistoryHinter::new(),
        }));

        if let Some(dir) = self.config.history_file.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let _ = rl.load_history(&self.config.history_file);

        loop {
            let prompt = console::style("You: ").green().bold().to_string();
            match rl.readline(&prompt) {
                Ok(line) => match classify(&line) {
                    Input::Empty => continue,
                    Input::Quit => break,
                    Input::Command(cmd) => {
                        let _ = rl.add_history_entry(cmd);
                        match self.handle_command(cmd).await {
                            CommandResult::Continue => {}
                            CommandResult::Quit => break,
                        }
                    }
                    Input::Message(message) => {
                        let _ = rl.add_history_entry(message);
                        self.send_message(message).await;
                    }
                },
                Err(ReadlineError::Interrupted) => {
                    eprintln!("{}", console::style("^C (type 'exit' to leave)").dim());
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    render::render_error(&err);
                    break;
                }
            }
        }

        let _ = rl.save_history(&self.config.history_file);

        if self.config.remember_on_exit {
            self.remember().await;
        }

        eprintln!("{}", console::style("Goodbye!").dim());
        Ok(())
    }

    /// Handle a slash command.
    async fn handle_command(&mut self, cmd: &str) -> CommandResult {
        let (name, rest) = cmd.split_once(char::is_whitespace).unwrap_or((cmd, ""));
        match name {
            "/help" => render::render_help(),
            "/quit" | "/exit" => return CommandResult::Quit,
            "/status" => render::render_status(
                &self.user_id,
                &self.session_id,
                &self.runner.agent().model,
                self.runner.session_backend(),
                self.runner.memory_backend(),
            ),
            "/recall" => {
                let query = rest.trim();
                if query.is_empty() {
                    eprintln!("{}", console::style("Usage: /recall <query>").dim());
                } else {
                    match self.runner.search_memory(&self.user_id, query).await {
                        Ok(response) => render::render_memories(query, &response),
                        Err(e) => render::render_error(&e),
                    }
                }
            }
            _ => {
                eprintln!("{}: {}", console::style("Unknown command").red(), cmd);
                render::render_help();
            }
        }
        CommandResult::Continue
    }

    /// Send a message and stream the answer.
    async fn send_message(&self, message: &str) {
        render::render_agent_prefix();

        let cancel = CancellationToken::new();
        let watcher = render::cancel_on_ctrl_c(cancel.clone());
        let stream = run_turn(&self.runner, &self.user_id, &self.session_id, message);
        let result = drain_turn(stream, &cancel, render::render_fragment).await;
        watcher.abort();

        match result {
            Ok(outcome) if outcome.cancelled => render::render_cancelled(),
            Ok(outcome) => {
                debug!("Turn finished after {} events", outcome.events);
                println!();
                println!();
            }
            Err(e) => {
                println!();
                render::render_error(&e);
            }
        }
    }

    /// Hand the session to long-term memory.
    async fn remember(&self) {
        match self
            .runner
            .add_session_to_memory(&self.user_id, &self.session_id)
            .await
        {
            Ok(()) => {}
            // Nothing was said; there is no session to remember.
            Err(AgentError::SessionNotFound(_)) => {
                debug!("No session {} to remember", self.session_id);
            }
            Err(e) => {
                warn!("Failed to add session to memory: {}", e);
                render::render_error(&e);
            }
        }
    }
}

/// Result of handling a slash command.
enum CommandResult {
    Continue,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_quit_words() {
        assert_eq!(classify("exit"), Input::Quit);
        assert_eq!(classify("  QUIT "), Input::Quit);
        assert_eq!(classify("quit the job"), Input::Message("quit the job"));
    }

    #[test]
    fn test_classify_commands_and_messages() {
        assert_eq!(classify("   "), Input::Empty);
        assert_eq!(classify("/recall revenue"), Input::Command("/recall revenue"));
        assert_eq!(
            classify(" Top 5 customers? "),
            Input::Message("Top 5 customers?")
        );
    }

    #[test]
    fn test_complete_command() {
        assert_eq!(complete_command("/re"), vec!["/recall".to_string()]);
        assert_eq!(complete_command("/q"), vec!["/quit".to_string()]);
        assert!(complete_command("show").is_empty());
        assert_eq!(complete_command("/").len(), COMMANDS.len());
    }
}
