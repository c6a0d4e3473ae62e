//! Raw PCM to WAV.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::AudioError;

/// Write little-endian signed 16-bit PCM bytes as a WAV file.
///
/// A trailing odd byte is dropped.
pub fn write_pcm16_wav(
    path: &Path,
    pcm: &[u8],
    sample_rate: u32,
    channels: u16,
) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for frame in pcm.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes([frame[0], frame[1]]))?;
    }
    writer.finalize()?;
    Ok(())
}
