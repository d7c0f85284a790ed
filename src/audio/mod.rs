//! Audio capture boundary
//!
//! A [`Recorder`] yields one [`AudioClip`] per capture; clips are encoded as
//! 16-bit mono WAV for the transcription service.

pub mod buffer;
#[cfg(feature = "audio-io")]
pub mod input;

pub use buffer::CaptureBuffer;
#[cfg(feature = "audio-io")]
pub use input::MicrophoneRecorder;

use crate::{Result, SwapVoiceError};
use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

/// Mono f32 samples in the -1.0..=1.0 range
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Encode as an in-memory 16-bit PCM WAV file
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: self.sample_rate.max(1),
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).map_err(|e| {
                SwapVoiceError::IOError(format!("Failed to create WAV writer: {}", e))
            })?;
            for &sample in &self.samples {
                let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer.write_sample(sample_i16).map_err(|e| {
                    SwapVoiceError::IOError(format!("Failed to write sample: {}", e))
                })?;
            }
            writer.finalize().map_err(|e| {
                SwapVoiceError::IOError(format!("Failed to finalize WAV: {}", e))
            })?;
        }

        let bytes = cursor.into_inner();
        debug!(
            "Encoded {} samples ({:.1}s) into {} WAV bytes",
            self.samples.len(),
            self.duration().as_secs_f32(),
            bytes.len()
        );
        Ok(bytes)
    }
}

/// Push-to-talk capture
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn start(&self) -> Result<()>;

    /// Stop capturing and hand back everything recorded since `start`
    async fn stop(&self) -> Result<AudioClip>;
}
