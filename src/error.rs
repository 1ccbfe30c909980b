//! Error types for the Babel gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Input device access was refused or the device is unavailable
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),

    /// A host capability (recognition or synthesis) is not available
    #[error("capability unsupported: {0}")]
    Unsupported(String),

    /// Mid-stream speech recognition failure
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Translation endpoint failure
    #[error("translation error: {0}")]
    Translation(String),

    /// Premium or native voice synthesis failure
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Audio device or playback error
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
