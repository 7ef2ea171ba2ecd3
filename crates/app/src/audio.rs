//! PCM helpers for synthesized speech.
//!
//! The TTS model returns raw mono signed 16-bit little-endian PCM at
//! 24 kHz; these helpers decode it for playback and wrap it in a WAV
//! container for saving.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Sample rate of the TTS model output.
pub const TTS_SAMPLE_RATE: u32 = 24_000;

/// Decode signed 16-bit little-endian PCM into `[-1.0, 1.0]` samples.
///
/// A trailing odd byte is ignored.
#[must_use]
pub fn decode_s16le(pcm: &[u8]) -> Vec<f32> {
    pcm.chunks_exact(2)
        .map(|pair| i16::from_le_bytes(pair.try_into().unwrap_or_default()))
        .map(|sample| f32::from(sample) / 32_768.0)
        .collect()
}

/// Wrap raw mono 16-bit PCM in a WAV container.
///
/// # Errors
///
/// Returns an error when the WAV writer rejects the data.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)?;

    for pair in pcm.chunks_exact(2) {
        writer.write_sample(i16::from_le_bytes(pair.try_into().unwrap_or_default()))?;
    }

    writer.finalize()?;

    Ok(cursor.into_inner())
}
