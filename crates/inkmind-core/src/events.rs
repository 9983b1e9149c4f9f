use serde::{Deserialize, Serialize};

use crate::chat::ChatMessage;
use crate::ids::SessionId;

/// Session lifecycle events emitted toward the UI collaborator.
///
/// `Display` carries the full ordered render list; emitting it repeatedly
/// within one turn is how incremental output reaches the display.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    #[serde(rename = "turn_start")]
    TurnStart { session_id: SessionId, turn: u32 },

    #[serde(rename = "text_delta")]
    TextDelta { session_id: SessionId, delta: String },

    #[serde(rename = "display")]
    Display {
        session_id: SessionId,
        history: Vec<ChatMessage>,
    },

    #[serde(rename = "compaction_started")]
    CompactionStarted { session_id: SessionId },

    #[serde(rename = "compaction_complete")]
    CompactionComplete {
        session_id: SessionId,
        dropped: usize,
    },

    #[serde(rename = "turn_complete")]
    TurnComplete { session_id: SessionId, turn: u32 },
}

impl SessionEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::TurnStart { session_id, .. }
            | Self::TextDelta { session_id, .. }
            | Self::Display { session_id, .. }
            | Self::CompactionStarted { session_id, .. }
            | Self::CompactionComplete { session_id, .. }
            | Self::TurnComplete { session_id, .. } => session_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TurnStart { .. } => "turn_start",
            Self::TextDelta { .. } => "text_delta",
            Self::Display { .. } => "display",
            Self::CompactionStarted { .. } => "compaction_started",
            Self::CompactionComplete { .. } => "compaction_complete",
            Self::TurnComplete { .. } => "turn_complete",
        }
    }
}
