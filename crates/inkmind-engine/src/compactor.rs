use std::sync::Arc;

use tracing::{debug, instrument, warn};

use inkmind_core::chat::{ChatMessage, ChatRequest, ChatRole};
use inkmind_core::gateway::ChatGateway;

use crate::prompts::SUMMARY_PROMPT;

/// Compaction only fires once the raw history is longer than this.
pub const HISTORY_FLOOR: usize = 10;
/// Entries kept verbatim after a compaction.
pub const RETAIN_WINDOW: usize = 6;
/// Output ceiling for the summarization call.
const SUMMARY_MAX_TOKENS: u32 = 200;

/// Periodically replaces the oldest raw turns with a short synthesized
/// summary, keeping the context bounded on long sessions. Trigger is a
/// function of turn count, not token size — a deliberate trade of accuracy
/// for simplicity.
pub struct HistoryCompactor {
    model: String,
    period: u32,
}

/// What a compaction pass did to the session.
#[derive(Debug, PartialEq, Eq)]
pub enum CompactionOutcome {
    Skipped,
    Compacted { dropped: usize },
}

impl HistoryCompactor {
    pub fn new(model: impl Into<String>, period: u32) -> Self {
        Self {
            model: model.into(),
            period: period.max(1),
        }
    }

    /// Both conditions required: an exact period multiple AND enough raw
    /// history to be worth compressing. Short sessions never compact.
    pub fn should_compact(&self, turn_count: u32, history_len: usize) -> bool {
        turn_count % self.period == 0 && history_len > HISTORY_FLOOR
    }

    /// Run a compaction pass if due. On fire, everything but the retained
    /// tail is summarized and dropped; the summary is replaced wholesale.
    /// Summarization failure degrades to an empty summary — it never raises
    /// and never blocks the turn.
    #[instrument(skip(self, gateway, raw_history, summary), fields(turn = turn_count))]
    pub async fn run(
        &self,
        gateway: &Arc<dyn ChatGateway>,
        turn_count: u32,
        raw_history: &mut Vec<ChatMessage>,
        summary: &mut String,
    ) -> CompactionOutcome {
        if !self.should_compact(turn_count, raw_history.len()) {
            return CompactionOutcome::Skipped;
        }

        let split = raw_history.len() - RETAIN_WINDOW;
        let dropped = split;
        *summary = self.summarize(gateway, &raw_history[..split]).await;
        raw_history.drain(..split);

        debug!(dropped, retained = raw_history.len(), "history compacted");
        CompactionOutcome::Compacted { dropped }
    }

    async fn summarize(&self, gateway: &Arc<dyn ChatGateway>, entries: &[ChatMessage]) -> String {
        if entries.is_empty() {
            return String::new();
        }

        let transcript = render_transcript(entries);
        let request = ChatRequest::new(
            &self.model,
            SUMMARY_MAX_TOKENS,
            vec![
                ChatMessage::system(SUMMARY_PROMPT),
                ChatMessage::user(transcript),
            ],
        );

        match gateway.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, kind = e.error_kind(), "summarization failed, summary cleared");
                String::new()
            }
        }
    }
}

/// `role: text` lines, one per entry, chronological.
fn render_transcript(entries: &[ChatMessage]) -> String {
    entries
        .iter()
        .map(|m| {
            let role = match m.role {
                ChatRole::System => "system",
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            };
            format!("{role}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
