use crate::profile::StoryProfile;

/// Fixed instruction block. Always the first system content sent to the
/// model; never dropped or truncated regardless of context size.
pub const GAME_MASTER_PROMPT: &str = include_str!("../prompts/game_master.txt");

/// Ruleset for the constrained rewrite pass over narration output.
pub const CORRECTION_PROMPT: &str = include_str!("../prompts/correction.txt");

/// Instruction for the rolling-summary synthesis call.
pub const SUMMARY_PROMPT: &str = "Summarize this roleplay history in 3-5 sentences. \
Keep key plot points, character names, decisions. Be concise.";

/// Instruction for the structured-profile extraction call.
pub const EXTRACTION_PROMPT: &str = "Extract roleplay profile from user input. \
Return ONLY valid JSON (no markdown, no backticks) with keys: \
genre, character_gender, character_species, universe, era, tone, npc_types, language. \
Use null for anything not mentioned.";

/// Opening-scene request for guided mode, seeded by the extracted profile.
pub fn opening_scene_request(profile: &StoryProfile) -> String {
    let lang = profile.language_or_default();
    format!(
        "Player profile: {}\n\n\
         Write the opening scene in {lang}. \
         Set atmosphere immediately. Ground the scene in a specific moment, place, and sensory detail. \
         Introduce the world and hint at the first tension through action and environment — not exposition. \
         No greeting. Start directly with the first word of the narrative.",
        profile.to_json()
    )
}

/// Continuation request for free mode: the player's scene is embedded
/// verbatim, with an explicit instruction not to rewrite it.
pub fn continuation_request(player_scene: &str) -> String {
    format!(
        "The player has written the opening scene below. \
         Read it carefully. Do NOT rewrite or summarize it. Continue the story from exactly where it ends.\n\n\
         PLAYER SCENE:\n{player_scene}\n\n\
         Continue as Game Master in the same language and style. \
         No greeting. No summary. Write only the next beat of the scene."
    )
}
