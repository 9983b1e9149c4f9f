use secrecy::SecretString;

/// Wraps an API key with secrecy protection (zeroized on drop, redacted in Debug).
#[derive(Clone)]
pub struct ApiKey(pub SecretString);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

impl ApiKey {
    /// Resolve a credential: the environment wins, a key typed into the UI
    /// is the fallback. Blank values count as absent.
    pub fn resolve(env_value: Option<String>, typed: Option<&str>) -> Option<Self> {
        let from_env = env_value.filter(|v| !v.trim().is_empty());
        let from_typed = typed
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from);
        from_env
            .or(from_typed)
            .map(|k| Self(SecretString::from(k)))
    }

    /// Resolve against the process environment.
    pub fn from_env(typed: Option<&str>) -> Option<Self> {
        Self::resolve(std::env::var(env_vars::GROQ_API_KEY).ok(), typed)
    }
}

/// Environment variable names.
pub mod env_vars {
    pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn api_key_debug_redacted() {
        let key = ApiKey(SecretString::from("gsk_12345"));
        let debug = format!("{:?}", key);
        assert!(!debug.contains("gsk_"), "key leaked in debug: {debug}");
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn env_wins_over_typed() {
        let key = ApiKey::resolve(Some("gsk_env".into()), Some("gsk_typed")).unwrap();
        assert_eq!(key.0.expose_secret(), "gsk_env");
    }

    #[test]
    fn typed_key_is_fallback() {
        let key = ApiKey::resolve(None, Some("  gsk_typed  ")).unwrap();
        assert_eq!(key.0.expose_secret(), "gsk_typed");

        let key = ApiKey::resolve(Some("   ".into()), Some("gsk_typed")).unwrap();
        assert_eq!(key.0.expose_secret(), "gsk_typed");
    }

    #[test]
    fn absent_everywhere_is_none() {
        assert!(ApiKey::resolve(None, None).is_none());
        assert!(ApiKey::resolve(Some(String::new()), Some("  ")).is_none());
    }
}
