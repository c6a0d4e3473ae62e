//! Conversion to the canonical narration format through ffmpeg.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::command::{
    CommandResolver, CommandRunner, CommandRunnerExt, HostOs, ToolId, to_execution_path_on,
};

use super::{AudioError, CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE};

/// Resamples/remuxes audio files with the resolved ffmpeg.
#[derive(Clone)]
pub struct AudioConverter {
    resolver: Arc<CommandResolver>,
    runner: Arc<dyn CommandRunner>,
    skip_bridge: bool,
}

impl AudioConverter {
    pub fn new(
        resolver: Arc<CommandResolver>,
        runner: Arc<dyn CommandRunner>,
        skip_bridge: bool,
    ) -> Self {
        Self {
            resolver,
            runner,
            skip_bridge,
        }
    }

    /// Convert `input` to a mono 22.05 kHz WAV at `output`.
    pub fn to_canonical_wav(&self, input: &Path, output: &Path) -> Result<(), AudioError> {
        self.convert(input, output, CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE)
    }

    /// Convert `input` to `output` with the given channel count and sample rate.
    pub fn convert(
        &self,
        input: &Path,
        output: &Path,
        channels: u16,
        sample_rate: u32,
    ) -> Result<(), AudioError> {
        let ffmpeg = self.resolver.resolve(ToolId::Ffmpeg)?;
        let host: HostOs = self.resolver.host();

        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            to_execution_path_on(host, input, &ffmpeg, self.skip_bridge),
            "-ac".to_string(),
            channels.to_string(),
            "-ar".to_string(),
            sample_rate.to_string(),
            to_execution_path_on(host, output, &ffmpeg, self.skip_bridge),
        ];
        debug!(input = %input.display(), output = %output.display(), "ffmpeg convert");

        let result = self.runner.output_vector(&ffmpeg, &args)?;
        if result.success() {
            Ok(())
        } else {
            Err(AudioError::Conversion(result.to_string()))
        }
    }
}
