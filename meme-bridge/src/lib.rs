//! # Meme Bridge
//!
//! Controller layer between the Meme Studio UI and its media backends.
//! Resolves a text prompt + style tag to cached bundle assets, materializes
//! per-item temp files, and owns the single playback slot with its blink
//! indicator.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                       MemeController (Main Thread)                     │
//! │                                                                        │
//! │  generate_meme(prompt, style)     play_sound(path, index)              │
//! │        │                                │                              │
//! │        ▼                                ▼                              │
//! │  AssetCache ──▶ temp files        AudioPlayer (worker thread)          │
//! │                                         │ on_finished / blink worker   │
//! └────────┬────────────────────────────────┼──────────────────────────────┘
//!          │      Snapshot after every mutation
//!          ▼                                ▼
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                     SharedMemeState (Arc<...>)                         │
//! │                                                                        │
//! │  playback: DirtyValue<PlaybackSnapshot>   memes: DirtyValue<Vec<...>>  │
//! │  logs: DirtyVec<LogEntry>                                              │
//! └────────┬───────────────────────────────────────────────────────────────┘
//!          │          Read on UI timer (single poll)
//!          ▼
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                       Meme Studio UI (widgets)                         │
//! │  poll read_if_dirty() / recv MemeEvent - re-renders list + play icons  │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! - [`MemeController`] - item list, asset resolution, playback state machine
//! - [`SharedMemeState`] - dirty-tracked snapshots for efficient UI polling
//! - [`AssetStore`] - read-only named-blob bundle (directory or in-memory)
//! - [`AudioPlayer`] - single-stream playback with a completion callback
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use meme_bridge::{DirAssetStore, MemeController, RodioPlayer};
//! use std::sync::Arc;
//!
//! let store = Arc::new(DirAssetStore::new("assets"));
//! let player = Arc::new(RodioPlayer::new()?);
//! let controller = MemeController::new(store, player);
//!
//! // === PRODUCER (user actions) ===
//! controller.generate_meme("dancing in the start dust", "classic");
//! let item = controller.memes()[0].clone();
//! controller.play_sound(&item.sound_path, 0);
//!
//! // === CONSUMER (UI thread on timer) ===
//! let shared = controller.shared_state();
//! if let Some(snapshot) = shared.playback.read_if_dirty() {
//!     update_play_icons(snapshot);
//! }
//! ```
//!
//! ## Design Principles
//!
//! 1. **Immutable Snapshots** - the UI never sees controller internals, only
//!    cloned snapshots and events
//! 2. **Single Poll Point** - all shared state reads on one UI timer via
//!    dirty flags
//! 3. **Degrade, Don't Propagate** - boundary operations swallow-and-log;
//!    a failed generate is a no-op, a failed start leaves the slot Stopped
//! 4. **Epoch-Scoped Workers** - the blink loop and completion callbacks
//!    capture a playback epoch and no-op once it is stale
//! 5. **Bounded Collections** - the log feed has a max size to prevent
//!    memory growth

pub mod assets;
pub mod controller;
pub mod data;
pub mod error;
pub mod player;
pub mod shared_state;

// Re-exports
pub use assets::{AssetCache, AssetStore, DirAssetStore, MemoryAssetStore, DEFAULT_KEY};
pub use controller::{MemeConfig, MemeController, PlaybackState};
pub use data::{current_timestamp, LogEntry, LogLevel, MemeEvent, MemeItem, PlaybackSnapshot};
pub use error::{MemeError, MemeResult};
pub use player::{AudioPlayer, FinishedCallback, MockPlayer, RodioPlayer};
pub use shared_state::{DirtyValue, DirtyVec, SharedMemeState};

/// Prompt phrases with dedicated image/sound sets
///
/// Matching is literal substring containment, evaluated in declaration order
/// with the first match winning; prompts matching none fall through to the
/// default image and the style-selected sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKey {
    /// "dancing in the start dust"
    StarDust,
    /// "chris with you my love"
    ChrisLove,
}

impl PromptKey {
    /// The asset-cache key (and the recognized phrase) for this entry
    pub fn asset_key(&self) -> &'static str {
        match self {
            PromptKey::StarDust => "dancing in the start dust",
            PromptKey::ChrisLove => "chris with you my love",
        }
    }

    /// First recognized phrase contained in `prompt`, if any
    pub fn from_prompt(prompt: &str) -> Option<Self> {
        [PromptKey::StarDust, PromptKey::ChrisLove]
            .into_iter()
            .find(|key| prompt.contains(key.asset_key()))
    }
}
