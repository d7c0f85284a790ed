//! Voice-driven swap and bridge assistant core
//!
//! Turns noisy, partial utterances into a validated swap/bridge order,
//! confirms it by voice, and hands it to a routing engine for execution.

pub mod audio;
pub mod config;
pub mod dialogue;
pub mod format;
pub mod gateway;
pub mod history;
pub mod intent;
pub mod metrics;
pub mod orchestrator;
pub mod speech;
pub mod wallet;

pub use config::SessionConfig;
pub use dialogue::{
    AppCommand, AppEvent, Collaborators, DialogueController, DialogueState, SessionStatus,
    SharedDialogueState,
};
pub use intent::{Intent, PartialIntent};
pub use orchestrator::{Orchestrator, OrchestratorHandle};

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SwapVoiceError {
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Transcription error: {0}")]
    TranscriptionError(String),

    #[error("Intent extraction error: {0}")]
    IntentError(String),

    #[error("Resolution error: {0}")]
    ResolutionError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Wallet error: {0}")]
    WalletError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Routing error: {0}")]
    RoutingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for SwapVoiceError {
    fn from(e: std::io::Error) -> Self {
        SwapVoiceError::IOError(e.to_string())
    }
}

impl From<reqwest::Error> for SwapVoiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            SwapVoiceError::NetworkError(e.to_string())
        } else {
            SwapVoiceError::ResolutionError(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SwapVoiceError {
    fn from(e: serde_json::Error) -> Self {
        SwapVoiceError::IntentError(e.to_string())
    }
}

impl SwapVoiceError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Hardware/device errors may require user intervention
            SwapVoiceError::AudioDeviceError(_) => false,
            // Collaborator failures are retried on the next turn
            SwapVoiceError::TranscriptionError(_) => true,
            SwapVoiceError::IntentError(_) => true,
            SwapVoiceError::ResolutionError(_) => true,
            SwapVoiceError::NetworkError(_) => true,
            SwapVoiceError::WalletError(_) => true,
            SwapVoiceError::ExecutionError(_) => true,
            SwapVoiceError::RoutingError(_) => true,
            SwapVoiceError::ConfigError(_) => false,
            SwapVoiceError::ChannelError(_) => false,
            SwapVoiceError::IOError(_) => false,
        }
    }

    /// Whether the failure means the service could not be reached at all
    pub fn is_offline(&self) -> bool {
        matches!(self, SwapVoiceError::NetworkError(_))
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            SwapVoiceError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone.".to_string()
            }
            SwapVoiceError::TranscriptionError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            SwapVoiceError::IntentError(_) => {
                "Something went wrong understanding your request.".to_string()
            }
            SwapVoiceError::ResolutionError(_) => {
                "I could not resolve the tokens. Please try again.".to_string()
            }
            SwapVoiceError::NetworkError(_) => {
                "Network looks offline. Please check your connection and try again.".to_string()
            }
            SwapVoiceError::WalletError(_) => {
                "Please connect your wallet using the widget and try again.".to_string()
            }
            SwapVoiceError::ExecutionError(_) => "Execution failed. Please try again.".to_string(),
            SwapVoiceError::RoutingError(_) => {
                "Route search failed. Please try again.".to_string()
            }
            SwapVoiceError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            SwapVoiceError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            SwapVoiceError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SwapVoiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_is_offline() {
        assert!(SwapVoiceError::NetworkError("refused".into()).is_offline());
        assert!(!SwapVoiceError::ResolutionError("404".into()).is_offline());
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(SwapVoiceError::ExecutionError("x".into()).is_recoverable());
        assert!(!SwapVoiceError::ConfigError("x".into()).is_recoverable());
        assert!(!SwapVoiceError::AudioDeviceError("x".into()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SwapVoiceError = io.into();
        assert!(matches!(err, SwapVoiceError::IOError(_)));
    }

    #[test]
    fn test_json_error_maps_to_intent_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: SwapVoiceError = parse.into();
        assert!(matches!(err, SwapVoiceError::IntentError(_)));
        assert_eq!(
            err.user_message(),
            "Something went wrong understanding your request."
        );
    }
}
