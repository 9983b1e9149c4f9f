use serde::{Deserialize, Serialize};

use inkmind_core::chat::ChatMessage;
use inkmind_core::ids::SessionId;

/// How a session establishes its opening scene.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// The player answers setup questions; a profile is extracted and the
    /// engine writes the opening scene.
    Guided,
    /// The player writes or pastes the opening scene themselves.
    Free,
}

/// Turn state machine. Narrating is terminal until the session is discarded.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingSetup,
    Narrating,
}

/// Welcome message seeded into the display for guided mode.
pub const GUIDED_WELCOME: &str = "Before we begin, tell me about the story you want to live.\n\n\
Answer these questions, all at once, in free text:\n\n\
1. Genre — romance, fantasy, sci-fi, horror, slice of life, historical, thriller, post-apocalyptic...\n\
2. Your character — gender, species or nature (human, vampire, android, elf...)\n\
3. Universe & Era — contemporary, medieval, futuristic, alternate history...\n\
4. Tone — dark & gritty, slow-burn, light & adventurous, mature, action-packed...\n\
5. NPCs — any character types you want? (love interest, rival, mentor, monster...)\n\
6. Language — what language should I narrate in?\n\n\
I'll handle the rest.";

/// Welcome message seeded into the display for free mode.
pub const FREE_WELCOME: &str = "Write or paste the scenario you want to play.\n\n\
A plot, a setting, a universe, a fanfiction — anything. As long or short as \
you like. I'll take it from there.";

/// All mutable state of one story. Created at mode selection, mutated
/// turn-by-turn by the controller, discarded at reset. Nothing persists.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub id: SessionId,
    pub mode: Mode,
    pub phase: Phase,
    pub profile: crate::profile::StoryProfile,
    /// One block of text standing in for everything older than the retained
    /// window. Empty until the first compaction; replaced wholesale.
    pub summary: String,
    /// Chronological user/assistant turns. Compaction removes a contiguous
    /// oldest prefix, nothing else.
    pub raw_history: Vec<ChatMessage>,
    /// What the UI renders, welcome message and placeholders included.
    pub display: Vec<ChatMessage>,
    pub turn_count: u32,
}

impl SessionState {
    pub fn new(mode: Mode) -> Self {
        let welcome = match mode {
            Mode::Guided => GUIDED_WELCOME,
            Mode::Free => FREE_WELCOME,
        };
        Self {
            id: SessionId::new(),
            mode,
            phase: Phase::AwaitingSetup,
            profile: crate::profile::StoryProfile::default(),
            summary: String::new(),
            raw_history: Vec::new(),
            display: vec![ChatMessage::assistant(welcome)],
            turn_count: 1,
        }
    }

    pub fn setup_done(&self) -> bool {
        self.phase == Phase::Narrating
    }

    /// Replace the text of the most recent display message (streamed
    /// partials, placeholder swaps).
    pub fn set_last_display(&mut self, content: impl Into<String>) {
        if let Some(last) = self.display.last_mut() {
            last.content = content.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmind_core::chat::ChatRole;

    #[test]
    fn new_session_awaits_setup() {
        let session = SessionState::new(Mode::Guided);
        assert_eq!(session.phase, Phase::AwaitingSetup);
        assert!(!session.setup_done());
        assert_eq!(session.turn_count, 1);
        assert!(session.raw_history.is_empty());
        assert!(session.summary.is_empty());
        assert!(session.profile.is_empty());
    }

    #[test]
    fn welcome_matches_mode() {
        let guided = SessionState::new(Mode::Guided);
        assert_eq!(guided.display.len(), 1);
        assert_eq!(guided.display[0].role, ChatRole::Assistant);
        assert!(guided.display[0].content.contains("Genre"));

        let free = SessionState::new(Mode::Free);
        assert!(free.display[0].content.contains("Write or paste"));
    }

    #[test]
    fn set_last_display_replaces_content() {
        let mut session = SessionState::new(Mode::Free);
        session.display.push(ChatMessage::assistant("..."));
        session.set_last_display("final text");
        assert_eq!(session.display.last().unwrap().content, "final text");
        // Does nothing catastrophic on an empty display
        session.display.clear();
        session.set_last_display("ignored");
        assert!(session.display.is_empty());
    }

    #[test]
    fn sessions_have_distinct_ids() {
        let a = SessionState::new(Mode::Free);
        let b = SessionState::new(Mode::Free);
        assert_ne!(a.id, b.id);
    }
}
