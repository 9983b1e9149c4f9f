use serde::{Deserialize, Serialize};

use crate::errors::GatewayError;

/// Events emitted during a streamed completion. Ordering contract:
///
/// Start → TextDelta* → Done
///
/// Error can appear at any point and terminates the stream.
#[derive(Clone, Debug)]
pub enum StreamEvent {
    Start,
    TextDelta { delta: String },
    Done { text: String, finish_reason: Option<FinishReason> },
    Error { error: GatewayError },
}

/// Why the model stopped generating.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
}

impl FinishReason {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "stop" => Some(Self::Stop),
            "length" => Some(Self::Length),
            _ => None,
        }
    }
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }

    pub fn is_content_delta(&self) -> bool {
        matches!(self, Self::TextDelta { .. })
    }
}
