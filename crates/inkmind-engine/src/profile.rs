use serde::{Deserialize, Serialize};

const DEFAULT_LANGUAGE: &str = "English";

/// Narrative attributes of a session, extracted once at setup.
/// Every field is optional; absent answers stay null.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoryProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_species: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npc_types: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl StoryProfile {
    pub fn is_empty(&self) -> bool {
        self.genre.is_none()
            && self.character_gender.is_none()
            && self.character_species.is_none()
            && self.universe.is_none()
            && self.era.is_none()
            && self.tone.is_none()
            && self.npc_types.is_none()
            && self.language.is_none()
    }

    /// Narration language, defaulting to English when not specified.
    pub fn language_or_default(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Compact JSON form, null fields omitted.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let profile = StoryProfile::default();
        assert!(profile.is_empty());
        assert_eq!(profile.language_or_default(), "English");
        assert_eq!(profile.to_json(), "{}");
    }

    #[test]
    fn populated_profile_not_empty() {
        let profile = StoryProfile {
            tone: Some("dark".into()),
            ..Default::default()
        };
        assert!(!profile.is_empty());
    }

    #[test]
    fn json_omits_null_fields() {
        let profile = StoryProfile {
            genre: Some("fantasy".into()),
            language: Some("French".into()),
            ..Default::default()
        };
        let json = profile.to_json();
        assert!(json.contains(r#""genre":"fantasy""#));
        assert!(json.contains(r#""language":"French""#));
        assert!(!json.contains("character_gender"));
    }

    #[test]
    fn deserializes_with_explicit_nulls() {
        let raw = r#"{"genre":"fantasy","character_gender":null,"character_species":"elf",
                      "universe":"medieval","era":null,"tone":"dark","npc_types":"rival",
                      "language":"French"}"#;
        let profile: StoryProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.genre.as_deref(), Some("fantasy"));
        assert_eq!(profile.character_species.as_deref(), Some("elf"));
        assert_eq!(profile.character_gender, None);
        assert_eq!(profile.language_or_default(), "French");
    }

    #[test]
    fn unknown_keys_ignored() {
        let raw = r#"{"genre":"horror","mood":"tense"}"#;
        let profile: StoryProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.genre.as_deref(), Some("horror"));
    }
}
