//! Speech-to-text over HTTP

use crate::audio::AudioClip;
use crate::{Result, SwapVoiceError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

/// Upload cap for one clip (25 MiB)
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip, lang: &str) -> Result<String>;
}

#[derive(Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Posts the clip as multipart `file` + `lang`
pub struct HttpTranscriber {
    client: Client,
    url: String,
}

impl HttpTranscriber {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, clip: &AudioClip, lang: &str) -> Result<String> {
        if clip.is_empty() {
            debug!("Empty clip, skipping transcription");
            return Ok(String::new());
        }

        let wav = clip.to_wav_bytes()?;
        if wav.len() > MAX_UPLOAD_BYTES {
            return Err(SwapVoiceError::TranscriptionError(format!(
                "clip exceeds maximum size: {} bytes (limit: {} bytes)",
                wav.len(),
                MAX_UPLOAD_BYTES
            )));
        }

        let part = Part::bytes(wav)
            .file_name("recording.wav")
            .mime_str("audio/wav")?;
        let form = Form::new().part("file", part).text("lang", lang.to_string());

        let response = self.client.post(&self.url).multipart(form).send().await?;
        let status = response.status();
        let body: TranscribeResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(SwapVoiceError::TranscriptionError(error));
        }
        if !status.is_success() {
            return Err(SwapVoiceError::TranscriptionError(format!(
                "transcribe returned {}",
                status
            )));
        }

        let text = body.text.unwrap_or_default().trim().to_string();
        info!("Transcribed: {}", text);
        Ok(text)
    }
}
