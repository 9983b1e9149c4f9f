use tracing::warn;

/// Default primary narration model.
pub const DEFAULT_NARRATION_MODEL: &str = "meta-llama/llama-4-maverick-17b-128e-instruct";
/// Default smaller model for summarization, extraction and correction.
pub const DEFAULT_UTILITY_MODEL: &str = "llama-3.3-70b-versatile";
/// Default narration output ceiling.
pub const DEFAULT_MAX_TOKENS: u32 = 900;
/// Default turns per compaction.
pub const DEFAULT_COMPACTION_PERIOD: u32 = 6;

/// Engine configuration, environment-level. Everything has a default; the
/// credential is resolved separately (see `inkmind_core::security`).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub narration_model: String,
    pub utility_model: String,
    pub max_tokens: u32,
    pub compaction_period: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            narration_model: DEFAULT_NARRATION_MODEL.into(),
            utility_model: DEFAULT_UTILITY_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            compaction_period: DEFAULT_COMPACTION_PERIOD,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Invalid numeric values fall back
    /// to defaults with a warning.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            narration_model: get("INKMIND_NARRATION_MODEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.narration_model),
            utility_model: get("INKMIND_UTILITY_MODEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.utility_model),
            max_tokens: parse_or(get("INKMIND_MAX_TOKENS"), defaults.max_tokens, "INKMIND_MAX_TOKENS"),
            compaction_period: parse_or(
                get("INKMIND_COMPACTION_PERIOD"),
                defaults.compaction_period,
                "INKMIND_COMPACTION_PERIOD",
            ),
        }
    }
}

fn parse_or(value: Option<String>, default: u32, key: &str) -> u32 {
    match value {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(key, value = %raw, "invalid numeric value, using default");
                default
            }
        },
    }
}
