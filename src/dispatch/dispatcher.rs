//! Uniform synthesis entry point over the selected provider.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::TtsConfig;
use crate::provider::{
    ProviderRegistry, SynthesisError, SynthesisOutcome, SynthesisRequest, TtsProvider,
};

use super::ProviderKind;

/// One text to narrate into one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationJob {
    /// Requested destination; its extension may be rewritten.
    pub output: PathBuf,
    pub text: String,
}

impl NarrationJob {
    pub fn new(output: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            text: text.into(),
        }
    }
}

/// Result of one successful narration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narration {
    /// File actually written, with the provider's extension.
    pub path: PathBuf,
    pub outcome: SynthesisOutcome,
}

/// Summary of a batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub generated: usize,
    pub cached: usize,
    /// Requested output and error message of every failed job.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.generated + self.cached
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sends every request to one provider chosen up front.
pub struct Dispatcher {
    provider: Arc<dyn TtsProvider>,
    language: String,
}

impl Dispatcher {
    pub fn new(
        registry: &ProviderRegistry,
        kind: ProviderKind,
        language: impl Into<String>,
    ) -> Result<Self, SynthesisError> {
        let provider = registry.require(kind.provider_name())?;
        Ok(Self::with_provider(provider, language))
    }

    /// Dispatcher for the provider `config` selects.
    pub fn from_config(registry: &ProviderRegistry, config: &TtsConfig) -> Result<Self, SynthesisError> {
        Self::new(registry, ProviderKind::select(config), config.lang.clone())
    }

    pub fn with_provider(provider: Arc<dyn TtsProvider>, language: impl Into<String>) -> Self {
        Self {
            provider,
            language: language.into(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// `output` with the extension the provider actually writes.
    pub fn target_path(&self, output: &Path) -> PathBuf {
        output.with_extension(self.provider.output_extension())
    }

    /// Narrate `text` into `output`, adjusting its extension.
    pub fn synthesize(&self, text: &str, output: &Path) -> Result<Narration, SynthesisError> {
        let path = self.target_path(output);
        if path != output {
            warn!(
                provider = self.provider.name(),
                requested = %output.display(),
                path = %path.display(),
                "output extension adjusted"
            );
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let request = SynthesisRequest::new(text, self.language.clone(), path.clone());
        let outcome = self.provider.synthesize(&request)?;
        Ok(Narration { path, outcome })
    }

    /// Narrate every job in order.
    ///
    /// Failed jobs are recorded and the run continues; a fatal error stops
    /// the run and is returned.
    pub fn synthesize_all(&self, jobs: &[NarrationJob]) -> Result<BatchReport, SynthesisError> {
        let mut report = BatchReport::default();
        for job in jobs {
            match self.synthesize(&job.text, &job.output) {
                Ok(narration) => match narration.outcome {
                    SynthesisOutcome::Generated => report.generated += 1,
                    SynthesisOutcome::Cached => report.cached += 1,
                },
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => report.failed.push((job.output.clone(), e.to_string())),
            }
        }

        info!(
            provider = self.provider.name(),
            generated = report.generated,
            cached = report.cached,
            failed = report.failed.len(),
            "batch done"
        );
        Ok(report)
    }
}
