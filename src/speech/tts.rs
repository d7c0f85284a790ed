//! Spoken output
//!
//! At most one utterance plays at a time: starting a new one cancels the
//! one in flight.

use parking_lot::Mutex;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Longest text handed to the TTS command (64 KiB)
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

pub trait Speaker: Send + Sync {
    /// Start speaking `text`, cancelling whatever is playing
    fn speak(&self, text: &str);

    fn cancel(&self);
}

/// Speaks through an external command such as `espeak`
///
/// The text is passed as the final argument.
pub struct VoiceOutput {
    program: String,
    args: Vec<String>,
    current: Mutex<Option<Child>>,
}

impl VoiceOutput {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current: Mutex::new(None),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn stop_current(&self) {
        if let Some(mut child) = self.current.lock().take() {
            if let Err(e) = child.start_kill() {
                debug!("Previous utterance already finished: {}", e);
            }
        }
    }
}

impl Speaker for VoiceOutput {
    fn speak(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        info!("Speaking: {}", text);
        self.stop_current();

        if text.len() > MAX_TTS_INPUT_BYTES {
            warn!("Utterance too long for TTS ({} bytes), not spoken", text.len());
            return;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("No async runtime, utterance not spoken");
            return;
        }

        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        match spawned {
            Ok(child) => *self.current.lock() = Some(child),
            Err(e) => warn!("Failed to spawn {}: {}", self.program, e),
        }
    }

    fn cancel(&self) {
        self.stop_current();
    }
}

/// Logs utterances without producing audio
#[derive(Debug, Default)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn speak(&self, text: &str) {
        if !text.trim().is_empty() {
            info!("Speaking: {}", text.trim());
        }
    }

    fn cancel(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speak_without_runtime_is_harmless() {
        let output = VoiceOutput::new("definitely-not-a-tts-binary");
        output.speak("hello");
        output.cancel();
        assert!(output.current.lock().is_none());
    }

    #[tokio::test]
    async fn test_missing_program_is_logged_not_fatal() {
        let output = VoiceOutput::new("definitely-not-a-tts-binary").with_args(vec!["-v".into()]);
        output.speak("Confirmed.");
        assert!(output.current.lock().is_none());
    }

    #[test]
    fn test_log_speaker() {
        LogSpeaker.speak("  ");
        LogSpeaker.speak("Please say yes or no.");
        LogSpeaker.cancel();
    }
}
