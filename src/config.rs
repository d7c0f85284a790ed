//! Session configuration
//!
//! Collaborator endpoints and dialogue timers, loadable from a TOML file.

use crate::{Result, SwapVoiceError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for one voice session
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Transcription endpoint (multipart `file` + `lang`)
    pub transcribe_url: String,

    /// Remote intent extraction endpoint
    pub intent_url: String,

    /// Token resolution endpoint
    pub resolve_token_url: String,

    /// ENS resolver base URL, the name is appended
    pub ens_resolver_url: String,

    /// Language hint passed to transcription
    pub language: String,

    /// Length of the yes/no capture window
    pub confirm_window_ms: u64,

    /// How long to wait for the wallet to report the switched network
    pub network_switch_wait_ms: u64,

    /// Timeout for token and ENS lookups
    pub http_timeout_ms: u64,

    /// Maximum cached token records
    pub token_cache_max: usize,

    /// Maximum kept transaction records
    pub history_max: usize,

    /// Channel buffer size
    pub channel_buffer_size: usize,

    /// Shutdown timeout in milliseconds
    pub shutdown_timeout_ms: u64,

    /// Open a voice capture after each proposal and route prompt
    pub voice_confirm: bool,

    /// External TTS command (e.g. `espeak`); utterances are only logged when unset
    pub tts_command: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transcribe_url: "http://localhost:3000/api/transcribe".to_string(),
            intent_url: "http://localhost:3000/api/intent".to_string(),
            resolve_token_url: "http://localhost:3000/api/resolve-token".to_string(),
            ens_resolver_url: "https://api.ensideas.com/ens/resolve/".to_string(),
            language: "en".to_string(),
            confirm_window_ms: 3000,
            network_switch_wait_ms: 1200,
            http_timeout_ms: 30_000,
            token_cache_max: 512,
            history_max: 50,
            channel_buffer_size: 100,
            shutdown_timeout_ms: 5000,
            voice_confirm: true,
            tts_command: None,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Point all three app endpoints at one base URL
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.transcribe_url = format!("{}/api/transcribe", base);
        self.intent_url = format!("{}/api/intent", base);
        self.resolve_token_url = format!("{}/api/resolve-token", base);
        self
    }

    /// Set the ENS resolver base URL
    pub fn with_ens_resolver_url(mut self, url: impl Into<String>) -> Self {
        self.ens_resolver_url = url.into();
        self
    }

    /// Set the transcription language hint
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the yes/no capture window
    pub fn with_confirm_window_ms(mut self, ms: u64) -> Self {
        self.confirm_window_ms = ms;
        self
    }

    /// Set the network switch wait
    pub fn with_network_switch_wait_ms(mut self, ms: u64) -> Self {
        self.network_switch_wait_ms = ms;
        self
    }

    /// Set the token cache bound
    pub fn with_token_cache_max(mut self, max: usize) -> Self {
        self.token_cache_max = max;
        self
    }

    /// Set the channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }

    /// Set the shutdown timeout
    pub fn with_shutdown_timeout_ms(mut self, timeout: u64) -> Self {
        self.shutdown_timeout_ms = timeout;
        self
    }

    /// Enable or disable the voice yes/no capture
    pub fn with_voice_confirm(mut self, enabled: bool) -> Self {
        self.voice_confirm = enabled;
        self
    }

    /// Speak through an external command
    pub fn with_tts_command(mut self, program: impl Into<String>) -> Self {
        self.tts_command = Some(program.into());
        self
    }

    pub fn confirm_window(&self) -> Duration {
        Duration::from_millis(self.confirm_window_ms)
    }

    pub fn network_switch_wait(&self) -> Duration {
        Duration::from_millis(self.network_switch_wait_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Default config location: `<config_dir>/swapvoice/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("swapvoice").join("config.toml"))
    }

    /// Load a configuration from a TOML file
    ///
    /// Keys left out of the file keep their default values.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SwapVoiceError::ConfigError(format!(
                "Failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: SessionConfig = toml::from_str(&content).map_err(|e| {
            SwapVoiceError::ConfigError(format!(
                "Failed to parse config '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        info!("Loaded session config from {}", path.display());
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("transcribe_url", &self.transcribe_url),
            ("intent_url", &self.intent_url),
            ("resolve_token_url", &self.resolve_token_url),
            ("ens_resolver_url", &self.ens_resolver_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return Err(SwapVoiceError::ConfigError(format!("{} is empty", name)));
            }
        }

        if self.token_cache_max == 0 {
            return Err(SwapVoiceError::ConfigError(
                "token_cache_max must be greater than zero".to_string(),
            ));
        }

        if self.channel_buffer_size == 0 {
            return Err(SwapVoiceError::ConfigError(
                "channel_buffer_size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
