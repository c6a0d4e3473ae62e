//! Coqui TTS command-line model synthesizer.

use std::sync::Arc;

use crate::cache::CacheKey;
use crate::command::ToolId;
use crate::config::CoquiSettings;

use super::{ProviderContext, SynthesisError, SynthesisOutcome, SynthesisRequest, TtsProvider};

const NAME: &str = "coqui";

/// Runs the `tts` CLI from coqui-tts, writing WAV directly.
pub struct CoquiProvider {
    ctx: Arc<ProviderContext>,
    settings: CoquiSettings,
}

impl CoquiProvider {
    pub fn new(ctx: Arc<ProviderContext>, settings: CoquiSettings) -> Self {
        Self { ctx, settings }
    }

    // use_cuda changes speed, not the audio
    fn cache_key(&self, text: &str) -> CacheKey {
        CacheKey::new(NAME)
            .text("text", text)
            .opt_text("speaker_idx", self.settings.speaker_idx.as_deref())
            .opt_text("language_idx", self.settings.language_idx.as_deref())
            .text("model", &self.settings.model)
    }

    fn generate(&self, request: &SynthesisRequest) -> Result<(), SynthesisError> {
        let tts = self.ctx.resolve(ToolId::Coqui)?;

        let mut args = vec![
            "--text".to_string(),
            request.text.clone(),
            "--model_name".to_string(),
            self.settings.model.clone(),
            "--out_path".to_string(),
            self.ctx.exec_path(&request.output_path, &tts),
        ];
        if let Some(language) = &self.settings.language_idx {
            args.extend(["--language_idx".to_string(), language.clone()]);
        }
        if self.settings.use_cuda {
            args.extend(["--use_cuda".to_string(), "1".to_string()]);
        }
        if let Some(speaker) = &self.settings.speaker_idx {
            args.extend(["--speaker_idx".to_string(), speaker.clone()]);
        }

        let output = self
            .ctx
            .run_tool(&tts, &args)
            .map_err(|e| SynthesisError::command(NAME, &request.text, e))?;
        if !output.success() {
            return Err(SynthesisError::backend(NAME, &request.text, output));
        }
        Ok(())
    }
}

impl TtsProvider for CoquiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_available(&self) -> Result<bool, SynthesisError> {
        Ok(self.ctx.is_resolvable(ToolId::Coqui))
    }

    fn output_extension(&self) -> &'static str {
        "wav"
    }

    fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisOutcome, SynthesisError> {
        let key = self.cache_key(&request.text);
        self.ctx
            .synthesize_cached(NAME, &key, request, || self.generate(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandOutput, HostOs, MockCommandRunner};
    use crate::config::CachePolicy;
    use crate::provider::test_support::{arg_after, context};
    use tempfile::TempDir;

    fn expect_probe(runner: &mut MockCommandRunner) {
        runner
            .expect_output()
            .withf(|cmd, args| cmd == "tts" && args == ["-h".to_string()].as_slice())
            .returning(|_, _| Ok(CommandOutput::ok("usage: tts")));
    }

    fn expect_synthesis(runner: &mut MockCommandRunner, times: usize) {
        runner
            .expect_output()
            .withf(|cmd, args| cmd == "tts" && args.first().map(String::as_str) == Some("--text"))
            .times(times)
            .returning(|_, args| {
                let out = arg_after(args, "--out_path").unwrap();
                std::fs::write(out, b"RIFF coqui").unwrap();
                Ok(CommandOutput::ok(""))
            });
    }

    fn settings() -> CoquiSettings {
        CoquiSettings {
            speaker_idx: Some("p225".to_string()),
            ..CoquiSettings::default()
        }
    }

    #[test]
    fn test_second_identical_request_is_a_cache_hit() {
        let temp = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        expect_probe(&mut runner);
        expect_synthesis(&mut runner, 1);

        let ctx = context(runner, HostOs::Unix, &temp, CachePolicy::default());
        let provider = CoquiProvider::new(ctx, settings());

        let first = SynthesisRequest::new("Le loup", "fr-FR", temp.path().join("a.wav"));
        assert_eq!(provider.synthesize(&first).unwrap(), SynthesisOutcome::Generated);

        let second = SynthesisRequest::new("Le loup", "fr-FR", temp.path().join("b.wav"));
        assert_eq!(provider.synthesize(&second).unwrap(), SynthesisOutcome::Cached);
        assert_eq!(std::fs::read(temp.path().join("b.wav")).unwrap(), b"RIFF coqui");
    }

    #[test]
    fn test_skip_read_cache_invokes_backend_again() {
        let temp = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        expect_probe(&mut runner);
        expect_synthesis(&mut runner, 2);

        let policy = CachePolicy {
            read: false,
            write: true,
        };
        let ctx = context(runner, HostOs::Unix, &temp, policy);
        let provider = CoquiProvider::new(ctx, settings());

        let request = SynthesisRequest::new("Le loup", "fr-FR", temp.path().join("a.wav"));
        provider.synthesize(&request).unwrap();
        assert_eq!(provider.synthesize(&request).unwrap(), SynthesisOutcome::Generated);
    }

    #[test]
    fn test_skip_write_cache_stores_nothing() {
        let temp = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        expect_probe(&mut runner);
        expect_synthesis(&mut runner, 1);

        let policy = CachePolicy {
            read: true,
            write: false,
        };
        let ctx = context(runner, HostOs::Unix, &temp, policy);
        let provider = CoquiProvider::new(Arc::clone(&ctx), settings());

        let request = SynthesisRequest::new("Le loup", "fr-FR", temp.path().join("a.wav"));
        provider.synthesize(&request).unwrap();

        let slot = ctx.cache().slot_path(&provider.cache_key("Le loup")).unwrap();
        assert!(!slot.exists());
    }

    #[test]
    fn test_optional_arguments() {
        let temp = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        expect_probe(&mut runner);
        runner
            .expect_output()
            .withf(|_, args| {
                arg_after(args, "--language_idx") == Some("fr")
                    && arg_after(args, "--use_cuda") == Some("1")
                    && arg_after(args, "--speaker_idx") == Some("p225")
                    && arg_after(args, "--model_name") == Some("tts_models/fr/css10/vits")
            })
            .times(1)
            .returning(|_, args| {
                std::fs::write(arg_after(args, "--out_path").unwrap(), b"RIFF").unwrap();
                Ok(CommandOutput::ok(""))
            });

        let ctx = context(runner, HostOs::Unix, &temp, CachePolicy::default());
        let provider = CoquiProvider::new(
            ctx,
            CoquiSettings {
                model: "tts_models/fr/css10/vits".to_string(),
                speaker_idx: Some("p225".to_string()),
                language_idx: Some("fr".to_string()),
                use_cuda: true,
            },
        );

        let request = SynthesisRequest::new("Bonjour", "fr-FR", temp.path().join("a.wav"));
        provider.synthesize(&request).unwrap();
    }

    #[test]
    fn test_backend_failure_leaves_no_output() {
        let temp = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        expect_probe(&mut runner);
        runner
            .expect_output()
            .withf(|_, args| args.first().map(String::as_str) == Some("--text"))
            .times(1)
            .returning(|_, args| {
                // Partial file before crashing
                std::fs::write(arg_after(args, "--out_path").unwrap(), b"RI").unwrap();
                Ok(CommandOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "model not found".to_string(),
                })
            });

        let ctx = context(runner, HostOs::Unix, &temp, CachePolicy::default());
        let provider = CoquiProvider::new(ctx, settings());

        let output = temp.path().join("a.wav");
        let err = provider
            .synthesize(&SynthesisRequest::new("Bonjour", "fr-FR", &output))
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Backend { .. }));
        assert!(!err.is_fatal());
        assert!(!output.exists());
    }

    #[test]
    fn test_clean_exit_without_audio_is_a_failure() {
        let temp = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        expect_probe(&mut runner);
        runner
            .expect_output()
            .withf(|_, args| args.first().map(String::as_str) == Some("--text"))
            .times(1)
            .returning(|_, _| Ok(CommandOutput::ok("")));

        let ctx = context(runner, HostOs::Unix, &temp, CachePolicy::default());
        let provider = CoquiProvider::new(Arc::clone(&ctx), settings());

        let output = temp.path().join("a.wav");
        let err = provider
            .synthesize(&SynthesisRequest::new("Bonjour", "fr-FR", &output))
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Backend { message, .. } if message.contains("no audio")));
        assert!(!output.exists());
        let slot = ctx.cache().slot_path(&provider.cache_key("Bonjour")).unwrap();
        assert!(!slot.exists());
    }

    #[test]
    fn test_empty_output_file_is_not_cached() {
        let temp = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        expect_probe(&mut runner);
        runner
            .expect_output()
            .withf(|_, args| args.first().map(String::as_str) == Some("--text"))
            .times(1)
            .returning(|_, args| {
                std::fs::write(arg_after(args, "--out_path").unwrap(), b"").unwrap();
                Ok(CommandOutput::ok(""))
            });

        let ctx = context(runner, HostOs::Unix, &temp, CachePolicy::default());
        let provider = CoquiProvider::new(Arc::clone(&ctx), settings());

        let output = temp.path().join("a.wav");
        assert!(provider
            .synthesize(&SynthesisRequest::new("Bonjour", "fr-FR", &output))
            .is_err());
        assert!(!output.exists());
        let slot = ctx.cache().slot_path(&provider.cache_key("Bonjour")).unwrap();
        assert!(!slot.exists());
    }

    #[test]
    fn test_cache_key_ignores_use_cuda() {
        let temp = TempDir::new().unwrap();
        let ctx = context(MockCommandRunner::new(), HostOs::Unix, &temp, CachePolicy::default());
        let cpu = CoquiProvider::new(Arc::clone(&ctx), settings());
        let gpu = CoquiProvider::new(
            ctx,
            CoquiSettings {
                use_cuda: true,
                ..settings()
            },
        );
        assert_eq!(cpu.cache_key("x"), gpu.cache_key("x"));
    }
}
