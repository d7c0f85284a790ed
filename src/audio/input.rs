//! Microphone capture via cpal
//!
//! The input stream lives on its own thread for the length of one capture;
//! the callback averages channels down to mono and appends to a shared
//! [`CaptureBuffer`].

use super::{AudioClip, CaptureBuffer, Recorder};
use crate::{Result, SwapVoiceError};
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Longest single capture kept
const MAX_CAPTURE_SECS: u32 = 60;

/// Buffer sizing rate; devices running faster keep proportionally less
const NOMINAL_RATE: u32 = 48_000;

const DEVICE_OPEN_TIMEOUT: Duration = Duration::from_secs(3);

struct CaptureSession {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
    sample_rate: u32,
}

pub struct MicrophoneRecorder {
    buffer: CaptureBuffer,
    session: Mutex<Option<CaptureSession>>,
}

impl MicrophoneRecorder {
    pub fn new() -> Self {
        Self {
            buffer: CaptureBuffer::for_duration(NOMINAL_RATE, MAX_CAPTURE_SECS),
            session: Mutex::new(None),
        }
    }
}

impl Default for MicrophoneRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Open the default input device and stream into `buffer` until `stop_rx`
/// fires. Reports the device sample rate, or the failure, on `ready_tx`.
fn run_capture(
    buffer: CaptureBuffer,
    ready_tx: Sender<Result<u32>>,
    stop_rx: crossbeam_channel::Receiver<()>,
) {
    let host = cpal::default_host();
    let device = match host.default_input_device() {
        Some(device) => device,
        None => {
            let _ = ready_tx.send(Err(SwapVoiceError::AudioDeviceError(
                "No input device available".into(),
            )));
            return;
        }
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    let config: cpal::StreamConfig = match device.default_input_config() {
        Ok(supported) => supported.into(),
        Err(e) => {
            let _ = ready_tx.send(Err(SwapVoiceError::AudioDeviceError(format!(
                "Failed to get input config: {}",
                e
            ))));
            return;
        }
    };
    let sample_rate = config.sample_rate.0;
    let channels = config.channels as usize;
    info!(
        "Capturing from {}: {}Hz, {} channel(s)",
        device_name, sample_rate, channels
    );

    let writer = buffer.clone();
    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if channels == 1 {
                writer.write(data);
            } else {
                let mono: Vec<f32> = data
                    .chunks(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                    .collect();
                writer.write(&mono);
            }
        },
        |err| error!("Audio input stream error: {}", err),
        None,
    );

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(SwapVoiceError::AudioDeviceError(format!(
                "Failed to build input stream: {}",
                e
            ))));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(SwapVoiceError::AudioDeviceError(format!(
            "Failed to start input stream: {}",
            e
        ))));
        return;
    }

    let _ = ready_tx.send(Ok(sample_rate));
    let _ = stop_rx.recv();
    drop(stream);
    debug!("Capture thread finished");
}

#[async_trait]
impl Recorder for MicrophoneRecorder {
    async fn start(&self) -> Result<()> {
        let mut session = self.session.lock();
        if session.is_some() {
            warn!("Already recording, ignoring start request");
            return Ok(());
        }

        self.buffer.clear();
        let (ready_tx, ready_rx) = bounded(1);
        let (stop_tx, stop_rx) = bounded(1);
        let buffer = self.buffer.clone();

        let handle = thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || run_capture(buffer, ready_tx, stop_rx))?;

        let sample_rate = ready_rx
            .recv_timeout(DEVICE_OPEN_TIMEOUT)
            .map_err(|_| SwapVoiceError::AudioDeviceError("Input device did not open".into()))??;

        *session = Some(CaptureSession {
            stop_tx,
            handle,
            sample_rate,
        });
        info!("Recording started");
        Ok(())
    }

    async fn stop(&self) -> Result<AudioClip> {
        let session = self.session.lock().take();
        let Some(session) = session else {
            warn!("Stop requested without an active recording");
            return Ok(AudioClip::default());
        };

        let _ = session.stop_tx.send(());
        if session.handle.join().is_err() {
            error!("Capture thread panicked");
        }

        let clip = AudioClip::new(self.buffer.drain(), session.sample_rate);
        info!(
            "Recording stopped: {:.1}s captured",
            clip.duration().as_secs_f32()
        );
        Ok(clip)
    }
}
