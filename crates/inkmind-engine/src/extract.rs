use std::sync::Arc;

use tracing::{instrument, warn};

use inkmind_core::chat::{ChatMessage, ChatRequest};
use inkmind_core::gateway::ChatGateway;

use crate::profile::StoryProfile;
use crate::prompts::EXTRACTION_PROMPT;

/// Output ceiling for the extraction call.
const EXTRACTION_MAX_TOKENS: u32 = 250;

/// Turns free-text setup answers into a structured profile via a constrained
/// extraction call. Best-effort: any call or parse failure yields an empty
/// profile and never blocks setup.
pub struct ProfileExtractor {
    model: String,
}

impl ProfileExtractor {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    #[instrument(skip(self, gateway, user_input))]
    pub async fn extract(&self, gateway: &Arc<dyn ChatGateway>, user_input: &str) -> StoryProfile {
        let request = ChatRequest::new(
            &self.model,
            EXTRACTION_MAX_TOKENS,
            vec![
                ChatMessage::system(EXTRACTION_PROMPT),
                ChatMessage::user(user_input),
            ],
        );

        let raw = match gateway.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, kind = e.error_kind(), "profile extraction failed, using empty profile");
                return StoryProfile::default();
            }
        };

        let cleaned = strip_code_fences(raw.trim());
        match serde_json::from_str(cleaned) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "profile JSON did not parse, using empty profile");
                StoryProfile::default()
            }
        }
    }
}

/// Models sometimes wrap the JSON in markdown fences despite instructions.
fn strip_code_fences(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("```") else {
        return raw;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmind_core::errors::GatewayError;
    use inkmind_llm::mock::{MockGateway, MockReply};

    fn gateway(replies: Vec<MockReply>) -> Arc<dyn ChatGateway> {
        Arc::new(MockGateway::new(replies))
    }

    #[tokio::test]
    async fn extracts_profile_from_json_reply() {
        let gw = gateway(vec![MockReply::text(
            r#"{"genre":"fantasy","character_species":"elf","universe":"medieval",
               "era":"medieval","tone":"dark","npc_types":"rival","language":"French"}"#,
        )]);
        let extractor = ProfileExtractor::new("util-model");

        let profile = extractor
            .extract(&gw, "fantasy, elf, medieval, dark, a rival, French")
            .await;
        assert_eq!(profile.genre.as_deref(), Some("fantasy"));
        assert_eq!(profile.character_species.as_deref(), Some("elf"));
        assert_eq!(profile.tone.as_deref(), Some("dark"));
        assert_eq!(profile.npc_types.as_deref(), Some("rival"));
        assert_eq!(profile.language.as_deref(), Some("French"));
    }

    #[tokio::test]
    async fn fenced_json_still_parses() {
        let gw = gateway(vec![MockReply::text(
            "```json\n{\"genre\":\"horror\",\"language\":\"Spanish\"}\n```",
        )]);
        let extractor = ProfileExtractor::new("util-model");

        let profile = extractor.extract(&gw, "horror in Spanish").await;
        assert_eq!(profile.genre.as_deref(), Some("horror"));
        assert_eq!(profile.language.as_deref(), Some("Spanish"));
    }

    #[tokio::test]
    async fn call_failure_yields_empty_profile() {
        let gw = gateway(vec![MockReply::Error(GatewayError::Timeout(
            std::time::Duration::from_secs(30),
        ))]);
        let extractor = ProfileExtractor::new("util-model");
        assert!(extractor.extract(&gw, "anything").await.is_empty());
    }

    #[tokio::test]
    async fn parse_failure_yields_empty_profile() {
        let gw = gateway(vec![MockReply::text("I could not determine a profile.")]);
        let extractor = ProfileExtractor::new("util-model");
        assert!(extractor.extract(&gw, "anything").await.is_empty());
    }

    #[tokio::test]
    async fn extraction_request_shape() {
        let held = Arc::new(MockGateway::new(vec![MockReply::text("{}")]));
        let gw: Arc<dyn ChatGateway> = held.clone();
        let extractor = ProfileExtractor::new("util-model");
        let _ = extractor.extract(&gw, "sci-fi, android").await;

        let requests = held.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 250);
        assert!(requests[0].system_content().unwrap().contains("ONLY valid JSON"));
        assert_eq!(requests[0].messages[1].content, "sci-fi, android");
    }

    #[test]
    fn fence_stripping() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
    }
}
