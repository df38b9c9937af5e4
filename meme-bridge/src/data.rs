//! Data types shared between the controller, the UI, and tests

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as epoch milliseconds
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// One generated meme: the original prompt plus its materialized media files
///
/// Immutable after creation. The temp files are owned by the item but never
/// deleted by this crate; the platform's temp-directory cleanup reclaims them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeItem {
    /// Path to the materialized image temp file
    pub image_path: PathBuf,
    /// Original prompt text
    pub text: String,
    /// Path to the materialized sound temp file
    pub sound_path: PathBuf,
    /// Creation time (epoch millis), for UI sort order
    pub created_at: u64,
}

/// Immutable snapshot of the playback slot, published after every mutation
///
/// Invariant: `active_index.is_some() == is_playing`, and at most one entry
/// of `blinking` is true (the active one, on its "on" phase).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Whether any item is currently playing
    pub is_playing: bool,
    /// Index of the playing item, if any
    pub active_index: Option<usize>,
    /// Blink flag per item, in item order
    pub blinking: Vec<bool>,
}

/// State-change notification delivered to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum MemeEvent {
    /// A new item was appended at `index`
    Generated { index: usize },
    /// Playback started for the item at `index`
    PlaybackStarted { index: usize },
    /// Playback stopped (explicitly or by natural completion) for `index`
    PlaybackStopped { index: usize },
    /// The blink flag for `index` flipped to `on`
    BlinkTick { index: usize, on: bool },
}

/// Log severity for entries surfaced to the UI log panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

/// One entry in the UI-visible log feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Component that produced the entry
    pub source: String,
    /// Epoch millis
    pub timestamp: u64,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            source: source.into(),
            timestamp: current_timestamp(),
        }
    }
}
