//! Speech synthesis providers.
//!
//! Every backend implements [`TtsProvider`] and follows the same flow:
//! derive a cache key, serve a cache hit, otherwise resolve its tools,
//! invoke them, post-process and store the result. The shared parts of
//! that flow live in [`ProviderContext`].

mod basic;
mod context;
mod coqui;
mod gemini;
mod gtts;
mod openai;
mod os_voice;
mod pico;
mod registry;

pub use basic::BasicProvider;
pub use context::ProviderContext;
pub use coqui::CoquiProvider;
pub use gemini::GeminiProvider;
pub use gtts::GttsProvider;
pub use openai::OpenAiProvider;
pub use os_voice::OsVoiceProvider;
pub use pico::PicoProvider;
pub use registry::{DEFAULT_PROVIDER, ProviderRegistry};

use std::path::PathBuf;

use thiserror::Error;

use crate::audio::AudioError;
use crate::command::{CommandError, ToolNotFoundError};

/// Errors that can occur during synthesis.
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// A required external tool is missing. Every later request would fail too.
    #[error(transparent)]
    ToolNotFound(#[from] ToolNotFoundError),

    #[error("{provider} gen KO for \"{text}\": {message}")]
    Backend {
        provider: String,
        text: String,
        message: String,
    },

    #[error("{provider} convert KO for \"{text}\": {message}")]
    PostProcess {
        provider: String,
        text: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Provider not registered: {0}")]
    ProviderNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthesisError {
    /// True when the whole run should stop rather than just this request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SynthesisError::ToolNotFound(_))
    }

    pub(crate) fn backend(provider: &str, text: &str, message: impl ToString) -> Self {
        SynthesisError::Backend {
            provider: provider.to_string(),
            text: text.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn command(provider: &str, text: &str, err: CommandError) -> Self {
        Self::backend(provider, text, err)
    }

    /// Post-processing failure; a missing ffmpeg stays fatal.
    pub(crate) fn post_process(provider: &str, text: &str, err: AudioError) -> Self {
        match err {
            AudioError::ToolNotFound(e) => SynthesisError::ToolNotFound(e),
            other => SynthesisError::PostProcess {
                provider: provider.to_string(),
                text: text.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// One "speak this text" request.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    /// BCP 47 style language tag (e.g. `fr-FR`).
    pub language: String,
    /// File the audio is written to.
    pub output_path: PathBuf,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        language: impl Into<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            output_path: output_path.into(),
        }
    }
}

/// How a successful synthesis was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// Copied from the cache; no backend ran.
    Cached,
    /// Produced by the backend.
    Generated,
}

/// Trait for text-to-speech backends.
#[cfg_attr(test, mockall::automock)]
pub trait TtsProvider: Send + Sync {
    /// Provider name, used for registry lookup and logging.
    fn name(&self) -> &'static str;

    /// Whether the backend can run here (tools installed, API key set, ...).
    fn is_available(&self) -> Result<bool, SynthesisError>;

    /// Extension of the file this provider writes (`wav`, `mp3`).
    fn output_extension(&self) -> &'static str;

    /// Write audio for `request.text` to `request.output_path`.
    fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError>;
}
