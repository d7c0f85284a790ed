//! Remote intent extraction
//!
//! The service answers `{ "intent": "<json object>" }`; the embedded object
//! carries the five intent fields, any of which may be null.

use crate::intent::{extract_local_intent, PartialIntent};
use crate::{Result, SwapVoiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Turns one utterance into a partial intent
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<PartialIntent>;
}

#[derive(Serialize)]
struct IntentRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct IntentResponse {
    #[serde(default)]
    intent: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode the `intent` payload, which is normally a JSON string but is
/// accepted as an inline object too
fn decode_intent(payload: Value) -> Result<PartialIntent> {
    let partial: PartialIntent = match payload {
        Value::String(raw) => serde_json::from_str(&raw)?,
        Value::Null => PartialIntent::default(),
        other => serde_json::from_value(other)?,
    };
    Ok(partial.normalized())
}

/// HTTP client for the remote extractor
pub struct HttpIntentClient {
    client: Client,
    url: String,
}

impl HttpIntentClient {
    /// No client-side timeout: a slow extractor delays the turn but is not
    /// abandoned
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl IntentExtractor for HttpIntentClient {
    async fn extract(&self, text: &str) -> Result<PartialIntent> {
        let response = self
            .client
            .post(&self.url)
            .json(&IntentRequest { text })
            .send()
            .await?;
        let status = response.status();
        let body: IntentResponse = response.json().await?;

        if let Some(error) = body.error {
            return Err(SwapVoiceError::IntentError(error));
        }
        if !status.is_success() {
            return Err(SwapVoiceError::IntentError(format!("intent returned {}", status)));
        }

        let partial = decode_intent(body.intent.unwrap_or(Value::Null))?;
        debug!("Remote intent: {:?}", partial);
        Ok(partial)
    }
}

/// Extractor that never leaves the process
#[derive(Default)]
pub struct LocalIntentExtractor;

#[async_trait]
impl IntentExtractor for LocalIntentExtractor {
    async fn extract(&self, text: &str) -> Result<PartialIntent> {
        Ok(extract_local_intent(text))
    }
}
