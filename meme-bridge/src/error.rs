//! Error types for the meme bridge

use thiserror::Error;

/// Errors produced by the meme bridge
#[derive(Error, Debug)]
pub enum MemeError {
    /// A logical asset key or bundle resource could not be resolved
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// Writing a materialized temp file failed
    #[error("File write failed: {0}")]
    FileWrite(String),

    /// The audio backend rejected or aborted a playback request
    #[error("Playback failed: {0}")]
    Playback(String),

    /// No usable audio output device
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A cross-thread channel send failed (receiver gone)
    #[error("Channel send failed")]
    ChannelSendError,

    /// Catch-all
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type for meme bridge operations
pub type MemeResult<T> = Result<T, MemeError>;
