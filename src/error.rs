//! Error types for wake-cue

use thiserror::Error;

/// Result type alias for wake-cue operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the wake word reaction pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or decoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Playback dispatch error
    #[error("playback error: {0}")]
    Playback(String),

    /// Wake word detector error
    #[error("wake word error: {0}")]
    WakeWord(String),

    /// Host application call failed
    #[error("host error: {0}")]
    Host(String),

    /// Plugin lifecycle error
    #[error("plugin error: {0}")]
    Plugin(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
