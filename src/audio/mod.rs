//! Audio post-processing shared by providers.

mod convert;
mod pcm;

pub use convert::AudioConverter;
pub use pcm::write_pcm16_wav;

use thiserror::Error;

use crate::command::{CommandError, ToolNotFoundError};

/// Sample rate every provider normalizes to.
pub const CANONICAL_SAMPLE_RATE: u32 = 22050;

/// Channel count every provider normalizes to.
pub const CANONICAL_CHANNELS: u16 = 1;

/// Errors that can occur while post-processing audio.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error(transparent)]
    ToolNotFound(#[from] ToolNotFoundError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Conversion failed: {0}")]
    Conversion(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandOutput, CommandResolver, HostOs, MockCommandRunner};
    use mockall::predicate::eq;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn converter(runner: MockCommandRunner, host: HostOs) -> AudioConverter {
        let runner: Arc<dyn crate::command::CommandRunner> = Arc::new(runner);
        let resolver = CommandResolver::new(host, PathBuf::from("tools"), runner.clone(), None);
        AudioConverter::new(Arc::new(resolver), runner, false)
    }

    #[test]
    fn test_write_pcm16_wav_produces_mono_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.wav");
        let pcm: Vec<u8> = [0i16, 1000, -1000, i16::MAX]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();

        write_pcm16_wav(&path, &pcm, 24000, 1).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 24000);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 1000, -1000, i16::MAX]);
    }

    #[test]
    fn test_write_pcm16_wav_drops_odd_trailing_byte() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("odd.wav");

        write_pcm16_wav(&path, &[0x10, 0x00, 0x7f], 24000, 1).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn test_canonical_conversion_arguments() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_output()
            .with(eq("ffmpeg"), eq(vec!["-version".to_string()]))
            .times(1)
            .returning(|_, _| Ok(CommandOutput::ok("ffmpeg version 6")));
        runner
            .expect_output()
            .withf(|cmd, args| {
                cmd == "ffmpeg"
                    && args
                        == [
                            "-y", "-i", "/tmp/in.mp3", "-ac", "1", "-ar", "22050", "/tmp/out.wav",
                        ]
                        .map(String::from)
                        .as_slice()
            })
            .times(1)
            .returning(|_, _| Ok(CommandOutput::ok("")));

        let converter = converter(runner, HostOs::Unix);
        converter
            .to_canonical_wav(Path::new("/tmp/in.mp3"), Path::new("/tmp/out.wav"))
            .unwrap();
    }

    #[test]
    fn test_conversion_failure_is_reported() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_output()
            .withf(|_, args| args.first().map(String::as_str) == Some("-version"))
            .returning(|_, _| Ok(CommandOutput::ok("")));
        runner
            .expect_output()
            .withf(|_, args| args.first().map(String::as_str) == Some("-y"))
            .times(1)
            .returning(|_, _| {
                Ok(CommandOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "Invalid data found when processing input".to_string(),
                })
            });

        let converter = converter(runner, HostOs::Unix);
        let err = converter
            .to_canonical_wav(Path::new("/tmp/in.mp3"), Path::new("/tmp/out.wav"))
            .unwrap_err();
        assert!(matches!(err, AudioError::Conversion(msg) if msg.contains("Invalid data")));
    }

    #[test]
    fn test_missing_ffmpeg_is_tool_not_found() {
        let mut runner = MockCommandRunner::new();
        runner
            .expect_output()
            .returning(|_, _| Ok(CommandOutput::with_code(127)));

        let converter = converter(runner, HostOs::Unix);
        let err = converter
            .to_canonical_wav(Path::new("/tmp/in.mp3"), Path::new("/tmp/out.wav"))
            .unwrap_err();
        assert!(matches!(err, AudioError::ToolNotFound(_)));
    }
}
