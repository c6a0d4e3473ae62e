//! SVOX pico2wave phoneme synthesizer.

use std::sync::Arc;

use crate::cache::CacheKey;
use crate::command::ToolId;

use super::{ProviderContext, SynthesisError, SynthesisOutcome, SynthesisRequest, TtsProvider};

const NAME: &str = "pico2wave";

/// Runs `pico2wave`, natively or through the bridge on Windows.
pub struct PicoProvider {
    ctx: Arc<ProviderContext>,
}

impl PicoProvider {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    fn cache_key(request: &SynthesisRequest) -> CacheKey {
        CacheKey::new(NAME)
            .text("lang", &request.language)
            .text("text", &request.text)
    }

    fn generate(&self, request: &SynthesisRequest) -> Result<(), SynthesisError> {
        let pico = self.ctx.resolve(ToolId::Pico2Wave)?;
        let args = vec![
            format!("-l={}", request.language),
            format!("-w={}", self.ctx.exec_path(&request.output_path, &pico)),
            request.text.clone(),
        ];

        let output = self
            .ctx
            .run_tool(&pico, &args)
            .map_err(|e| SynthesisError::command(NAME, &request.text, e))?;
        if !output.success() {
            return Err(SynthesisError::backend(NAME, &request.text, output));
        }
        Ok(())
    }
}

impl TtsProvider for PicoProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_available(&self) -> Result<bool, SynthesisError> {
        Ok(self.ctx.is_resolvable(ToolId::Pico2Wave))
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }

    fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError> {
        let key = Self::cache_key(request);
        self.ctx
            .synthesize_cached(NAME, &key, request, || self.generate(request))
    }
}
