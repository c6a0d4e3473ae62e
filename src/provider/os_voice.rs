//! Voice built into the operating system.

use std::sync::Arc;

use crate::cache::CacheKey;
use crate::command::{HostOs, ToolId};

use super::{ProviderContext, SynthesisError, SynthesisOutcome, SynthesisRequest, TtsProvider};

const NAME: &str = "os-voice";

// 8 kHz, 16 bit, mono
const WINDOWS_AUDIO_FORMAT: &str = "[System.Speech.AudioFormat.SpeechAudioFormatInfo]::\
    new(8000,[System.Speech.AudioFormat.AudioBitsPerSample]::Sixteen,\
    [System.Speech.AudioFormat.AudioChannel]::Mono)";

/// System.Speech through PowerShell on Windows, `say` on macOS.
pub struct OsVoiceProvider {
    ctx: Arc<ProviderContext>,
}

impl OsVoiceProvider {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    fn cache_key(host: HostOs, text: &str) -> CacheKey {
        let discriminator = match host {
            HostOs::Windows => "windows_tts",
            HostOs::MacOs | HostOs::Unix => "macos_tts",
        };
        CacheKey::new(discriminator).text("text", text)
    }

    fn windows_script(text: &str, output: &str) -> String {
        // The text is spliced into a double-quoted PowerShell string
        let spoken: String = text
            .chars()
            .map(|c| if matches!(c, '"' | '\'' | '`' | '$') { ' ' } else { c })
            .collect();
        // Single-quoted literals are not interpolated; `'` is escaped by doubling
        let output = output.replace('\'', "''");
        format!(
            "Add-Type -AssemblyName System.Speech; \
             $speak = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
             $speak.SetOutputToWaveFile('{output}',{WINDOWS_AUDIO_FORMAT}); \
             $speak.Speak(\" . {spoken} . \"); \
             $speak.Dispose();"
        )
    }

    fn generate_windows(&self, request: &SynthesisRequest) -> Result<(), SynthesisError> {
        let powershell = self.ctx.resolve(ToolId::OsVoice)?;
        let output = self.ctx.exec_path(&request.output_path, &powershell);
        let args = vec![
            "-NoProfile".to_string(),
            "-Command".to_string(),
            Self::windows_script(&request.text, &output),
        ];

        let result = self
            .ctx
            .run_tool(&powershell, &args)
            .map_err(|e| SynthesisError::command(NAME, &request.text, e))?;
        if !result.success() {
            return Err(SynthesisError::backend(NAME, &request.text, result));
        }
        Ok(())
    }

    fn generate_macos(&self, request: &SynthesisRequest) -> Result<(), SynthesisError> {
        let say = self.ctx.resolve(ToolId::OsVoice)?;
        let scratch = self.ctx.scratch_dir(&request.output_path)?;
        let raw = scratch.path().join("raw.aiff");

        let args = vec![
            request.text.clone(),
            "-o".to_string(),
            raw.to_string_lossy().into_owned(),
        ];
        let result = self
            .ctx
            .run_tool(&say, &args)
            .map_err(|e| SynthesisError::command(NAME, &request.text, e))?;
        if !result.success() {
            return Err(SynthesisError::backend(NAME, &request.text, result));
        }

        self.ctx
            .converter()
            .to_canonical_wav(&raw, &request.output_path)
            .map_err(|e| SynthesisError::post_process(NAME, &request.text, e))
    }
}

impl TtsProvider for OsVoiceProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_available(&self) -> Result<bool, SynthesisError> {
        Ok(self.ctx.is_resolvable(ToolId::OsVoice))
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }

    fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError> {
        let host = self.ctx.host();
        let key = Self::cache_key(host, &request.text);
        self.ctx.synthesize_cached(NAME, &key, request, || match host {
            HostOs::Windows => self.generate_windows(request),
            HostOs::MacOs => self.generate_macos(request),
            HostOs::Unix => {
                self.ctx.resolve(ToolId::OsVoice)?;
                Err(SynthesisError::Configuration(
                    "no system voice on this platform".to_string(),
                ))
            }
        })
    }
}
