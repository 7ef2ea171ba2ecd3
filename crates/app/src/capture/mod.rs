//! Microphone capture
//!
//! Records the default input device into an in-memory WAV buffer ready
//! for transcription. The device stream is held exclusively between
//! `start` and `stop` and released on every exit path, including errors.

use std::{
    io::Cursor,
    sync::{Arc, Mutex},
};

use cpal::{
    Device, SampleFormat, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use hound::{SampleFormat as WavSampleFormat, WavSpec, WavWriter};
use thiserror::Error;

/// Errors from microphone capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// `start` was called while a recording is active.
    #[error("a recording is already in progress")]
    AlreadyRecording,

    /// `stop` was called with no active recording.
    #[error("no active recording to stop")]
    NoActiveRecording,

    /// No audio input device is available.
    #[error("no audio input device found")]
    NoInputDevice,

    /// The device exposes no usable default configuration.
    #[error("no supported input configuration")]
    NoSupportedConfig,

    /// The input stream could not be created or started.
    #[error("failed to open input stream: {0}")]
    Stream(String),

    /// Captured samples could not be encoded as WAV.
    #[error("failed to encode WAV data")]
    Encode(#[from] hound::Error),
}

struct ActiveRecording {
    stream: Stream,
    samples: Arc<Mutex<Vec<i16>>>,
    channels: u16,
    sample_rate: u32,
}

/// Records the default input device into an in-memory sample buffer.
#[derive(Default)]
pub struct MicRecorder {
    active: Option<ActiveRecording>,
}

impl std::fmt::Debug for MicRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicRecorder")
            .field("recording", &self.active.is_some())
            .finish()
    }
}

impl MicRecorder {
    /// Create an idle recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a recording is currently active.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Start capturing from the default input device.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::AlreadyRecording`] when a recording is in
    /// progress, or a device/stream error when the input cannot be opened.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.active.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;

        let supported = device
            .default_input_config()
            .map_err(|_| CaptureError::NoSupportedConfig)?;

        tracing::info!(
            sample_rate = supported.sample_rate().0,
            channels = supported.channels(),
            format = ?supported.sample_format(),
            "opening input stream"
        );

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let samples = Arc::new(Mutex::new(Vec::new()));

        let stream = build_input_stream(&device, &config, sample_format, Arc::clone(&samples))?;

        stream
            .play()
            .map_err(|error| CaptureError::Stream(error.to_string()))?;

        self.active = Some(ActiveRecording {
            stream,
            samples,
            channels: config.channels,
            sample_rate: config.sample_rate.0,
        });

        Ok(())
    }

    /// Stop capturing and package the samples as a WAV byte buffer.
    ///
    /// The device stream is dropped (and the device released) before
    /// encoding, so it is freed even when encoding fails.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoActiveRecording`] when nothing is being
    /// recorded, or an encoding error.
    pub fn stop(&mut self) -> Result<Vec<u8>, CaptureError> {
        let active = self.active.take().ok_or(CaptureError::NoActiveRecording)?;

        drop(active.stream);

        let samples = active
            .samples
            .lock()
            .map_err(|_| CaptureError::Stream("sample buffer poisoned".to_owned()))?;

        tracing::info!(samples = samples.len(), "recording stopped");

        encode_wav(&samples, active.channels, active.sample_rate)
    }
}

fn build_input_stream(
    device: &Device,
    config: &StreamConfig,
    format: SampleFormat,
    samples: Arc<Mutex<Vec<i16>>>,
) -> Result<Stream, CaptureError> {
    let stream = match format {
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| push_i16(&samples, data),
            log_stream_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| push_f32(&samples, data),
            log_stream_error,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| push_u16(&samples, data),
            log_stream_error,
            None,
        ),
        other => {
            return Err(CaptureError::Stream(format!(
                "unsupported sample format {other:?}"
            )));
        }
    };

    stream.map_err(|error| CaptureError::Stream(error.to_string()))
}

fn log_stream_error(error: cpal::StreamError) {
    tracing::warn!(%error, "input stream error");
}

fn push_i16(samples: &Mutex<Vec<i16>>, data: &[i16]) {
    if let Ok(mut buffer) = samples.lock() {
        buffer.extend_from_slice(data);
    }
}

fn push_f32(samples: &Mutex<Vec<i16>>, data: &[f32]) {
    if let Ok(mut buffer) = samples.lock() {
        buffer.extend(
            data.iter()
                .map(|sample| (sample.clamp(-1.0, 1.0) * 32_767.0) as i16),
        );
    }
}

fn push_u16(samples: &Mutex<Vec<i16>>, data: &[u16]) {
    if let Ok(mut buffer) = samples.lock() {
        buffer.extend(data.iter().map(|sample| (i32::from(*sample) - 32_768) as i16));
    }
}

fn encode_wav(samples: &[i16], channels: u16, sample_rate: u32) -> Result<Vec<u8>, CaptureError> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: WavSampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)?;

    for sample in samples {
        writer.write_sample(*sample)?;
    }

    writer.finalize()?;

    Ok(cursor.into_inner())
}
