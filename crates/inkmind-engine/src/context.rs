use serde_json::json;

use inkmind_core::chat::ChatMessage;

use crate::profile::StoryProfile;
use crate::prompts::GAME_MASTER_PROMPT;

/// How many raw-history entries ride along with each narration call.
pub const HISTORY_WINDOW: usize = 8;

/// Assembles the outbound message list for a turn: the fixed instruction
/// block first, then a bounded window of recent turns, then the user input.
pub struct ContextBuilder;

impl ContextBuilder {
    /// The system message for a turn. The instruction block is always the
    /// start of it; profile/summary are appended as a single serialized
    /// context block — never a separate message, never a replacement.
    pub fn build_system(profile: &StoryProfile, summary: &str) -> String {
        let mut ctx = serde_json::Map::new();
        if !profile.is_empty() {
            ctx.insert(
                "player_profile".into(),
                serde_json::to_value(profile).unwrap_or(json!({})),
            );
        }
        if !summary.is_empty() {
            ctx.insert("story_so_far".into(), json!(summary));
        }

        let mut system = GAME_MASTER_PROMPT.to_string();
        if !ctx.is_empty() {
            let block = serde_json::Value::Object(ctx).to_string();
            system.push_str(&format!(
                "\n\n--- CURRENT STORY CONTEXT ---\n{block}\n--- END CONTEXT ---"
            ));
        }
        system
    }

    /// The full narration message list: system, last `HISTORY_WINDOW` raw
    /// turns, current user input.
    pub fn build_messages(
        profile: &StoryProfile,
        summary: &str,
        raw_history: &[ChatMessage],
        user_input: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(raw_history.len().min(HISTORY_WINDOW) + 2);
        messages.push(ChatMessage::system(Self::build_system(profile, summary)));

        let start = raw_history.len().saturating_sub(HISTORY_WINDOW);
        messages.extend(raw_history[start..].iter().cloned());

        messages.push(ChatMessage::user(user_input));
        messages
    }
}
