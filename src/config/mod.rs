//! Configuration: defaults, optional TOML file, API key resolution.

mod settings;

pub use settings::{
    ApiKey, CachePolicy, CoquiSettings, GEMINI_API_KEY_ENV, GeminiSettings, OPENAI_API_KEY_ENV,
    OpenAiSettings, TtsConfig, resolve_api_key,
};

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = TtsConfig::default();
        assert_eq!(config.lang, "fr-FR");
        assert_eq!(config.openai.model, "tts-1");
        assert_eq!(config.openai.voice, "alloy");
        assert_eq!(config.gemini.model, "gemini-2.5-flash-preview-tts");
        assert_eq!(config.gemini.voice, "Kore");
        assert!(!config.use_openai && !config.use_gemini && !config.use_gtts && !config.use_coqui);
        assert_eq!(config.cache_policy(), CachePolicy::default());
    }

    #[test]
    fn test_toml_overlays_defaults() {
        let config = TtsConfig::from_toml(
            r#"
            use_coqui = true
            lang = "en-US"
            skip_write_cache = true

            [coqui]
            speaker_idx = "p225"
            "#,
        )
        .unwrap();

        assert!(config.use_coqui);
        assert_eq!(config.lang, "en-US");
        assert_eq!(config.coqui.speaker_idx.as_deref(), Some("p225"));
        // Untouched sections keep their defaults
        assert_eq!(config.coqui.model, CoquiSettings::default().model);
        assert_eq!(config.openai.voice, "alloy");
        assert_eq!(
            config.cache_policy(),
            CachePolicy {
                read: true,
                write: false
            }
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cache_path = \"/var/cache/narrator\"").unwrap();

        let config = TtsConfig::load(file.path()).unwrap();
        assert_eq!(config.cache_root(), PathBuf::from("/var/cache/narrator"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = TtsConfig::load(std::path::Path::new("/nonexistent/narrator.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_invalid_toml() {
        let result = TtsConfig::from_toml("use_openai = \"maybe\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-very-secret");
        let settings = OpenAiSettings {
            api_key: Some(key.clone()),
            ..OpenAiSettings::default()
        };
        assert!(!format!("{key:?}").contains("sk-very"));
        assert!(!format!("{settings:?}").contains("sk-very"));
    }

    #[test]
    fn test_configured_api_key_wins() {
        let key = ApiKey::new("configured");
        let resolved = resolve_api_key(Some(&key), "PACK_NARRATOR_TEST_UNSET_KEY");
        assert_eq!(resolved.unwrap().expose(), "configured");
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let key = ApiKey::new("   ");
        assert!(resolve_api_key(Some(&key), "PACK_NARRATOR_TEST_UNSET_KEY").is_none());
    }
}
