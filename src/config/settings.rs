//! TTS configuration values.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;
use crate::cache::TtsCache;

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Secret API key. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    fn non_empty(self) -> Option<Self> {
        if self.0.trim().is_empty() { None } else { Some(self) }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Configured key first, then the environment variable `env_var`.
pub fn resolve_api_key(configured: Option<&ApiKey>, env_var: &str) -> Option<ApiKey> {
    configured
        .cloned()
        .and_then(ApiKey::non_empty)
        .or_else(|| std::env::var(env_var).ok().map(ApiKey).and_then(ApiKey::non_empty))
}

/// Top-level TTS configuration.
///
/// Every field has a default, so a TOML file only needs the values it
/// changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub use_openai: bool,
    pub use_gemini: bool,
    pub use_gtts: bool,
    pub use_coqui: bool,
    /// Language tag passed to language-aware backends (e.g. `fr-FR`).
    pub lang: String,
    pub cache_path: Option<PathBuf>,
    pub skip_wsl: bool,
    pub skip_read_cache: bool,
    pub skip_write_cache: bool,
    pub openai: OpenAiSettings,
    pub gemini: GeminiSettings,
    pub coqui: CoquiSettings,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            use_openai: false,
            use_gemini: false,
            use_gtts: false,
            use_coqui: false,
            lang: "fr-FR".to_string(),
            cache_path: None,
            skip_wsl: false,
            skip_read_cache: false,
            skip_write_cache: false,
            openai: OpenAiSettings::default(),
            gemini: GeminiSettings::default(),
            coqui: CoquiSettings::default(),
        }
    }
}

impl TtsConfig {
    /// Load a TOML file on top of the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Configured cache root or the default one.
    pub fn cache_root(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(TtsCache::default_root)
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            read: !self.skip_read_cache,
            write: !self.skip_write_cache,
        }
    }
}

/// Whether the cache may be consulted and filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub read: bool,
    pub write: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            read: true,
            write: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: Option<ApiKey>,
    pub model: String,
    pub voice: String,
    pub speed: Option<f32>,
    pub base_url: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            speed: None,
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

impl OpenAiSettings {
    pub fn api_key(&self) -> Option<ApiKey> {
        resolve_api_key(self.api_key.as_ref(), OPENAI_API_KEY_ENV)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub api_key: Option<ApiKey>,
    pub model: String,
    pub voice: String,
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

impl GeminiSettings {
    pub fn api_key(&self) -> Option<ApiKey> {
        resolve_api_key(self.api_key.as_ref(), GEMINI_API_KEY_ENV)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoquiSettings {
    pub model: String,
    pub speaker_idx: Option<String>,
    pub language_idx: Option<String>,
    pub use_cuda: bool,
}

impl Default for CoquiSettings {
    fn default() -> Self {
        Self {
            model: "tts_models/multilingual/multi-dataset/xtts_v2".to_string(),
            speaker_idx: None,
            language_idx: None,
            use_cuda: false,
        }
    }
}
