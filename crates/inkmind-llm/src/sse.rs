use serde::Deserialize;

use inkmind_core::stream::{FinishReason, StreamEvent};

/// End-of-stream sentinel in the chat-completions SSE protocol.
const DONE_MARKER: &str = "[DONE]";

/// Stateful parser for chat-completions SSE chunks. Accumulates text deltas
/// so the terminal `Done` event carries the full reply.
pub struct SseParser {
    text: String,
    finish_reason: Option<FinishReason>,
    started: bool,
    finished: bool,
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SseParser {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            finish_reason: None,
            started: false,
            finished: false,
        }
    }

    /// Parse one `data:` payload and return zero or more StreamEvents.
    /// Malformed payloads are skipped.
    pub fn parse_data(&mut self, data: &str) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if self.finished {
            return events;
        }

        if data.trim() == DONE_MARKER {
            self.finished = true;
            events.push(StreamEvent::Done {
                text: self.text.clone(),
                finish_reason: self.finish_reason,
            });
            return events;
        }

        let Ok(chunk) = serde_json::from_str::<ChunkPayload>(data) else {
            return events;
        };

        if !self.started {
            self.started = true;
            events.push(StreamEvent::Start);
        }

        for choice in &chunk.choices {
            if let Some(content) = choice.delta.content.as_deref() {
                if !content.is_empty() {
                    self.text.push_str(content);
                    events.push(StreamEvent::TextDelta {
                        delta: content.to_string(),
                    });
                }
            }
            if let Some(reason) = choice.finish_reason.as_deref() {
                self.finish_reason = FinishReason::from_wire(reason);
            }
        }

        events
    }

    /// Whether the terminal Done event has been emitted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Extract `data:` payloads from raw SSE text.
pub fn parse_sse_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .filter_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
        .map(|payload| payload.trim_start().to_string())
        .filter(|payload| !payload.is_empty())
        .collect()
}

// --- Deserialization types for chat-completions SSE chunks ---

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}
