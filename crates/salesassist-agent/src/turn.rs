//! Turn loop: submit one message and drain the resulting events.

use crate::runner::{EventStream, Runner};
use crate::Result;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Start one turn. Nothing runs until the stream is polled.
pub fn run_turn<'a>(
    runner: &'a Runner,
    user_id: &str,
    session_id: &str,
    message: &str,
) -> EventStream<'a> {
    runner.run(user_id, session_id, message)
}

/// What a drained turn produced.
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    /// Text fragments in emission order.
    pub fragments: Vec<String>,

    /// Number of events consumed.
    pub events: usize,

    /// Consumption stopped because of cancellation.
    pub cancelled: bool,
}

impl TurnOutcome {
    /// The displayed response: every fragment, concatenated in order.
    pub fn text(&self) -> String {
        self.fragments.concat()
    }
}

/// Drain `stream`, passing each text fragment to `on_text` as it arrives.
///
/// Stops immediately when `cancel` fires; events already emitted stay
/// emitted. An error item ends the turn with that error.
pub async fn drain_turn<F>(
    mut stream: EventStream<'_>,
    cancel: &CancellationToken,
    mut on_text: F,
) -> Result<TurnOutcome>
where
    F: FnMut(&str),
{
    let mut outcome = TurnOutcome::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Turn cancelled after {} events", outcome.events);
                outcome.cancelled = true;
                break;
            }
            next = stream.next() => next,
        };

        let Some(item) = next else {
            break;
        };
        let event = item?;
        outcome.events += 1;

        for fragment in event.text_fragments() {
            on_text(fragment);
            outcome.fragments.push(fragment.to_string());
        }
    }

    Ok(outcome)
}

/// Run a turn to completion and return the displayed text.
pub async fn ask(runner: &Runner, user_id: &str, session_id: &str, message: &str) -> Result<String> {
    let stream = run_turn(runner, user_id, session_id, message);
    let outcome = drain_turn(stream, &CancellationToken::new(), |_| {}).await?;
    Ok(outcome.text())
}
