//! Speech in and out: transcription client and voice output

pub mod stt;
pub mod tts;

pub use stt::{HttpTranscriber, Transcriber};
pub use tts::{LogSpeaker, Speaker, VoiceOutput};
