//! Error types for the timer engine
//!
//! None of these surface from ticks or statistics. Settings errors are
//! returned to the caller of a setter; store and sink errors are logged by
//! the engine and otherwise ignored.

use thiserror::Error;

/// Rejected settings input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{field} must be at least 1 minute, got {value}")]
    InvalidDuration { field: &'static str, value: u32 },

    #[error("long break interval must be at least 2, got {0}")]
    InvalidInterval(u32),

    #[error("unknown sound: {0}")]
    UnknownSound(String),
}

/// Failure inside a key/value store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure delivering a sound or a notification
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sound playback failed: {0}")]
    Sound(String),

    #[error("Notification delivery failed: {0}")]
    Notification(String),
}
