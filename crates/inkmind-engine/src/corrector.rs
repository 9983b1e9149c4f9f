use std::sync::Arc;

use tracing::{debug, instrument, warn};

use inkmind_core::chat::{ChatMessage, ChatRequest};
use inkmind_core::gateway::ChatGateway;

use crate::prompts::CORRECTION_PROMPT;

/// Artifacts the model occasionally emits when it loses coherence.
/// Their presence means the text cannot be trusted at all.
const GLITCH_MARKERS: &[&str] = &[
    "Page web",
    "WebPage",
    "scalablytyped",
    "XPERIA",
    ".cmo",
    "OnCollision",
];

/// Substitute reply when corrupted output is suppressed.
const PLACEHOLDER: &str = "...";

/// A rewrite shorter than this fraction of the original is over-deletion.
const MIN_KEEP_RATIO: f64 = 0.4;

/// Output ceiling for the rewrite call.
const CORRECTION_MAX_TOKENS: u32 = 1400;

/// Passes raw narration through a constrained rewrite that deletes or fixes
/// text violating the style contract. Returns either a corrected version or
/// the original, never an error.
pub struct OutputCorrector {
    model: String,
}

impl OutputCorrector {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn contains_glitch(text: &str) -> bool {
        GLITCH_MARKERS.iter().any(|marker| text.contains(marker))
    }

    #[instrument(skip(self, gateway, raw))]
    pub async fn correct(&self, gateway: &Arc<dyn ChatGateway>, raw: &str) -> String {
        if raw.trim().is_empty() {
            return raw.to_string();
        }

        // Corrupted input cannot be trusted to correct itself.
        if Self::contains_glitch(raw) {
            warn!("corruption marker in raw output, substituting placeholder");
            return PLACEHOLDER.to_string();
        }

        let request = ChatRequest::new(
            &self.model,
            CORRECTION_MAX_TOKENS,
            vec![
                ChatMessage::system(CORRECTION_PROMPT),
                ChatMessage::user(raw),
            ],
        );

        let result = match gateway.complete(&request).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, kind = e.error_kind(), "correction call failed, keeping raw text");
                return raw.to_string();
            }
        };

        if Self::contains_glitch(&result) {
            warn!("corruption marker in corrected output, keeping raw text");
            return raw.to_string();
        }

        let raw_len = raw.chars().count() as f64;
        let result_len = result.chars().count() as f64;
        if result_len >= raw_len * MIN_KEEP_RATIO {
            result
        } else {
            debug!(
                raw_chars = raw_len,
                corrected_chars = result_len,
                "rewrite too short, keeping raw text"
            );
            raw.to_string()
        }
    }
}
