//! ENS name resolution

use crate::{Result, SwapVoiceError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Resolves a `.eth` name to an address
#[async_trait]
pub trait EnsResolver: Send + Sync {
    /// `Ok(None)` when the name exists without an address or is unknown
    async fn resolve(&self, name: &str) -> Result<Option<String>>;
}

#[derive(Deserialize)]
struct EnsResponse {
    #[serde(default)]
    #[allow(dead_code)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

pub struct HttpEnsResolver {
    client: Client,
    base_url: String,
}

impl HttpEnsResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwapVoiceError::ConfigError(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url_for(&self, name: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, name)
        } else {
            format!("{}/{}", self.base_url, name)
        }
    }
}

#[async_trait]
impl EnsResolver for HttpEnsResolver {
    async fn resolve(&self, name: &str) -> Result<Option<String>> {
        let url = self.url_for(name);
        debug!("Resolving ENS name via {}", url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SwapVoiceError::ResolutionError(format!(
                "Resolver error: {}",
                response.status()
            )));
        }
        let body: EnsResponse = response.json().await?;
        Ok(body.address.filter(|a| !a.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        let with_slash =
            HttpEnsResolver::new("https://ens.example/resolve/", Duration::from_secs(1)).unwrap();
        assert_eq!(with_slash.url_for("vitalik.eth"), "https://ens.example/resolve/vitalik.eth");

        let without =
            HttpEnsResolver::new("https://ens.example/resolve", Duration::from_secs(1)).unwrap();
        assert_eq!(without.url_for("a.eth"), "https://ens.example/resolve/a.eth");
    }

    #[test]
    fn test_response_without_address() {
        let body: EnsResponse = serde_json::from_str(r#"{"name":"nobody.eth","address":null}"#).unwrap();
        assert!(body.address.is_none());
    }
}
