//! Error taxonomy
//!
//! Engine errors and low confidence never fail an activation call; the session
//! manager reports them as session updates carrying a `RecognitionError`.

use std::path::PathBuf;

use crate::recognition::ErrorCode;
use crate::state::AuthorizationState;

/// Activation and session-level failures
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("Microphone permission denied ({0})")]
    PermissionDenied(AuthorizationState),

    #[error("Speech recognition is not available on this platform")]
    EnvironmentUnsupported,

    #[error("Speech recognition has not been authorized")]
    NotAuthorized,

    #[error("Recognition engine error: {0}")]
    Backend(#[from] BackendError),
}

/// Engine errors as reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognitionError {
    #[error("{}", .0.user_message())]
    Transient(ErrorCode),

    #[error("{}", .0.user_message())]
    Fatal(ErrorCode),

    #[error("{} (gave up after {attempts} attempts)", .last.user_message())]
    RetriesExhausted { last: ErrorCode, attempts: u32 },
}

impl RecognitionError {
    pub fn code(&self) -> &ErrorCode {
        match self {
            RecognitionError::Transient(code) | RecognitionError::Fatal(code) => code,
            RecognitionError::RetriesExhausted { last, .. } => last,
        }
    }
}

/// Failures reported by a recognition backend implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("No speech engine available")]
    Unavailable,

    #[error("Failed to start engine: {0}")]
    Start(String),

    #[error("Permission request failed: {0}")]
    Permission(String),

    #[error("Host bridge disconnected")]
    Disconnected,
}

/// Why a transcript did not produce a control-surface call
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no voice command received")]
    Empty,

    #[error("unrecognized: {0}")]
    Unrecognized(String),

    #[error("no video loaded")]
    NoVideoLoaded,

    #[error("player unavailable")]
    PlayerUnavailable,

    #[error("{0}")]
    Control(#[from] ControlError),
}

/// Errors raised by a video control surface
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("{operation} failed: {reason}")]
    Failed {
        operation: &'static str,
        reason: String,
    },

    #[error("invalid {name}: {value}")]
    InvalidArgument { name: &'static str, value: f64 },
}

/// A URL that cannot be turned into something playable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("{description}")]
    Unsupported {
        platform: String,
        description: String,
    },

    #[error("Could not find a {platform} video id in the URL")]
    MissingVideoId { platform: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
