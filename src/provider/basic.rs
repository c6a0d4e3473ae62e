//! Baseline provider: system voice or pico2wave, whichever the host offers.

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::command::HostOs;

use super::{
    OsVoiceProvider, PicoProvider, ProviderContext, SynthesisError, SynthesisOutcome,
    SynthesisRequest, TtsProvider,
};

const NAME: &str = "basic";

/// Always-available fallback.
///
/// On Windows the system voice is used unless pico2wave is reachable through
/// the bridge; on macOS unless pico2wave is installed. Everywhere else
/// pico2wave is used.
pub struct BasicProvider {
    ctx: Arc<ProviderContext>,
    os_voice: OsVoiceProvider,
    pico: PicoProvider,
    pico_available: OnceLock<bool>,
}

impl BasicProvider {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self {
            os_voice: OsVoiceProvider::new(Arc::clone(&ctx)),
            pico: PicoProvider::new(Arc::clone(&ctx)),
            ctx,
            pico_available: OnceLock::new(),
        }
    }

    fn has_pico(&self) -> bool {
        *self
            .pico_available
            .get_or_init(|| self.pico.is_available().unwrap_or(false))
    }

    fn backend(&self) -> &dyn TtsProvider {
        let use_os_voice = match self.ctx.host() {
            HostOs::Windows => self.ctx.skip_bridge() || !self.has_pico(),
            HostOs::MacOs => !self.has_pico(),
            HostOs::Unix => false,
        };
        if use_os_voice {
            &self.os_voice
        } else {
            &self.pico
        }
    }
}

impl TtsProvider for BasicProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_available(&self) -> Result<bool, SynthesisError> {
        Ok(true)
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }

    fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError> {
        let backend = self.backend();
        debug!(backend = backend.name(), path = %request.output_path.display(), "basic TTS");
        backend.synthesize(request)
    }
}
