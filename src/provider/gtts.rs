//! Google Translate TTS through `gtts-cli`.

use std::sync::Arc;

use crate::cache::CacheKey;
use crate::command::ToolId;

use super::{ProviderContext, SynthesisError, SynthesisOutcome, SynthesisRequest, TtsProvider};

const NAME: &str = "gtts";

/// Runs `gtts-cli` to an mp3 and converts it to the canonical WAV.
pub struct GttsProvider {
    ctx: Arc<ProviderContext>,
}

impl GttsProvider {
    pub fn new(ctx: Arc<ProviderContext>) -> Self {
        Self { ctx }
    }

    /// `fr-FR` and `fr_FR` both become `fr`.
    fn primary_language(tag: &str) -> &str {
        tag.split(['-', '_'])
            .next()
            .filter(|l| !l.is_empty())
            .unwrap_or("fr")
    }

    fn cache_key(request: &SynthesisRequest) -> CacheKey {
        CacheKey::new(NAME)
            .text("text", &request.text)
            .text("lang", Self::primary_language(&request.language))
    }

    fn generate(&self, request: &SynthesisRequest) -> Result<(), SynthesisError> {
        let gtts = self.ctx.resolve(ToolId::Gtts)?;
        let scratch = self.ctx.scratch_dir(&request.output_path)?;
        let mp3 = scratch.path().join("gtts.mp3");

        let args = vec![
            "-l".to_string(),
            Self::primary_language(&request.language).to_string(),
            "-o".to_string(),
            self.ctx.exec_path(&mp3, &gtts),
            request.text.clone(),
        ];
        let output = self
            .ctx
            .run_tool(&gtts, &args)
            .map_err(|e| SynthesisError::command(NAME, &request.text, e))?;
        if !output.success() {
            return Err(SynthesisError::backend(NAME, &request.text, output));
        }

        self.ctx
            .converter()
            .to_canonical_wav(&mp3, &request.output_path)
            .map_err(|e| SynthesisError::post_process(NAME, &request.text, e))
    }
}

impl TtsProvider for GttsProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_available(&self) -> Result<bool, SynthesisError> {
        Ok(self.ctx.is_resolvable(ToolId::Gtts))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandOutput, HostOs, MockCommandRunner};
    use crate::config::CachePolicy;
    use crate::provider::test_support::{arg_after, context, leftovers};
    use tempfile::TempDir;

    fn expect_probes(runner: &mut MockCommandRunner) {
        runner
            .expect_output()
            .withf(|cmd, args| cmd == "gtts-cli" && args == ["-h".to_string()].as_slice())
            .returning(|_, _| Ok(CommandOutput::ok("usage")));
        runner
            .expect_output()
            .withf(|cmd, args| cmd == "ffmpeg" && args == ["-version".to_string()].as_slice())
            .returning(|_, _| Ok(CommandOutput::ok("ffmpeg")));
    }

    fn expect_gtts_success(runner: &mut MockCommandRunner) {
        runner
            .expect_output()
            .withf(|cmd, args| cmd == "gtts-cli" && args.first().map(String::as_str) == Some("-l"))
            .times(1)
            .returning(|_, args| {
                assert_eq!(arg_after(args, "-l"), Some("en"));
                std::fs::write(arg_after(args, "-o").unwrap(), b"ID3 mp3").unwrap();
                Ok(CommandOutput::ok(""))
            });
    }

    #[test]
    fn test_primary_language() {
        assert_eq!(GttsProvider::primary_language("fr-FR"), "fr");
        assert_eq!(GttsProvider::primary_language("pt_BR"), "pt");
        assert_eq!(GttsProvider::primary_language("de"), "de");
        assert_eq!(GttsProvider::primary_language(""), "fr");
    }

    #[test]
    fn test_regional_variants_share_a_slot() {
        let us = GttsProvider::cache_key(&SynthesisRequest::new("Hi", "en-US", "a.wav"));
        let gb = GttsProvider::cache_key(&SynthesisRequest::new("Hi", "en-GB", "a.wav"));
        assert_eq!(us, gb);
    }

    #[test]
    fn test_generates_mp3_then_converts() {
        let temp = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        expect_probes(&mut runner);
        expect_gtts_success(&mut runner);
        runner
            .expect_output()
            .withf(|cmd, args| cmd == "ffmpeg" && args.first().map(String::as_str) == Some("-y"))
            .times(1)
            .returning(|_, args| {
                assert_eq!(std::fs::read(&args[2]).unwrap(), b"ID3 mp3");
                assert_eq!(arg_after(args, "-ar"), Some("22050"));
                std::fs::write(&args[7], b"RIFF wav").unwrap();
                Ok(CommandOutput::ok(""))
            });

        let ctx = context(runner, HostOs::Unix, &temp, CachePolicy::default());
        let provider = GttsProvider::new(ctx);
        let output = temp.path().join("a.wav");

        let outcome = provider
            .synthesize(&SynthesisRequest::new("Hello", "en-US", &output))
            .unwrap();
        assert_eq!(outcome, SynthesisOutcome::Generated);
        assert_eq!(std::fs::read(&output).unwrap(), b"RIFF wav");
        assert!(leftovers(temp.path(), &["a.wav", "cache"]).is_empty());
    }

    #[test]
    fn test_conversion_failure_cleans_up_and_skips_cache() {
        let temp = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        expect_probes(&mut runner);
        expect_gtts_success(&mut runner);
        runner
            .expect_output()
            .withf(|cmd, args| cmd == "ffmpeg" && args.first().map(String::as_str) == Some("-y"))
            .times(1)
            .returning(|_, args| {
                std::fs::write(&args[7], b"RIFF trunc").unwrap();
                Ok(CommandOutput::with_code(1))
            });

        let ctx = context(runner, HostOs::Unix, &temp, CachePolicy::default());
        let provider = GttsProvider::new(Arc::clone(&ctx));
        let output = temp.path().join("a.wav");
        let request = SynthesisRequest::new("Hello", "en-US", &output);

        let err = provider.synthesize(&request).unwrap_err();
        assert!(matches!(err, SynthesisError::PostProcess { .. }));
        assert!(!output.exists());
        assert!(leftovers(temp.path(), &[]).is_empty());
        let slot = ctx.cache().slot_path(&GttsProvider::cache_key(&request)).unwrap();
        assert!(!slot.exists());
    }

    #[test]
    fn test_backend_failure_cleans_up() {
        let temp = TempDir::new().unwrap();
        let mut runner = MockCommandRunner::new();
        expect_probes(&mut runner);
        runner
            .expect_output()
            .withf(|cmd, args| cmd == "gtts-cli" && args.first().map(String::as_str) == Some("-l"))
            .times(1)
            .returning(|_, args| {
                std::fs::write(arg_after(args, "-o").unwrap(), b"ID3").unwrap();
                Ok(CommandOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "Connection error".to_string(),
                })
            });

        let ctx = context(runner, HostOs::Unix, &temp, CachePolicy::default());
        let provider = GttsProvider::new(ctx);
        let output = temp.path().join("a.wav");

        let err = provider
            .synthesize(&SynthesisRequest::new("Hello", "en-US", &output))
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Backend { message, .. } if message.contains("Connection error")));
        assert!(leftovers(temp.path(), &[]).is_empty());
    }
}
