//! Asset store abstraction and the preloaded asset cache
//!
//! The bundle that ships with the app is modeled as a read-only named-blob
//! store. At startup the cache eagerly loads the recognized image assets into
//! memory and registers the sound resource names; sound bytes are read from
//! the store lazily, at generation time.

use crate::PromptKey;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Logical key that always resolves, for both images and sounds
pub const DEFAULT_KEY: &str = "default";

/// Builtin manifest: logical image key -> bundle resource name
static BUILTIN_IMAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (PromptKey::StarDust.asset_key(), "img3.jpeg"),
        (PromptKey::ChrisLove.asset_key(), "img1.jpeg"),
        (DEFAULT_KEY, "img4.jpeg"),
    ])
});

/// Builtin manifest: logical sound key -> bundle resource name
static BUILTIN_SOUNDS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("hip hop", "hip_hop.mp3"),
        ("classic", "classic.mp3"),
        (PromptKey::StarDust.asset_key(), "dancing_in_the_start_dust.mp3"),
        (PromptKey::ChrisLove.asset_key(), "chris_with_you_my_love.mp3"),
        (DEFAULT_KEY, "hip_hop.mp3"),
    ])
});

/// Read-only store of named byte blobs (the app's asset bundle)
pub trait AssetStore: Send + Sync {
    /// Load the named asset in full. Absence is an error.
    fn load(&self, name: &str) -> Result<Vec<u8>>;
}

/// Asset store backed by a directory on disk
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for DirAssetStore {
    fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(name);
        fs::read(&path).with_context(|| format!("Failed to read asset {}", path.display()))
    }
}

/// In-memory asset store, for tests and headless use
#[derive(Default)]
pub struct MemoryAssetStore {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(name.into(), bytes);
    }

    /// A store populated with every builtin manifest entry (tiny placeholder bytes)
    pub fn with_builtin_assets() -> Self {
        let mut store = Self::new();
        for name in BUILTIN_IMAGES.values() {
            store.insert(*name, vec![0xFF, 0xD8, 0xFF]);
        }
        for name in BUILTIN_SOUNDS.values() {
            store.insert(*name, vec![0x49, 0x44, 0x33]);
        }
        store
    }
}

impl AssetStore for MemoryAssetStore {
    fn load(&self, name: &str) -> Result<Vec<u8>> {
        self.assets
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No such asset: {}", name))
    }
}

/// Preloaded mapping from logical keys to image bytes and sound resource names
///
/// Populated once at construction, read-only thereafter. A load failure is
/// logged and leaves that entry out of the cache; construction itself never
/// fails.
pub struct AssetCache {
    store: Arc<dyn AssetStore>,
    images: HashMap<String, Vec<u8>>,
    sounds: HashMap<String, String>,
}

impl AssetCache {
    /// Preload image bytes and register sound resource names from the store
    pub fn preload(store: Arc<dyn AssetStore>) -> Self {
        let mut images = HashMap::new();
        for (key, name) in BUILTIN_IMAGES.iter() {
            match store.load(name) {
                Ok(bytes) => {
                    ::log::debug!("Preloaded image asset '{}' ({} bytes)", key, bytes.len());
                    images.insert(key.to_string(), bytes);
                }
                Err(e) => {
                    ::log::warn!("Failed to preload image asset '{}': {}", key, e);
                }
            }
        }

        // Sound bytes are loaded at generation time; only the names are cached.
        let sounds: HashMap<String, String> = BUILTIN_SOUNDS
            .iter()
            .map(|(key, name)| (key.to_string(), name.to_string()))
            .collect();

        ::log::info!(
            "Asset cache ready: {} images, {} sound mappings",
            images.len(),
            sounds.len()
        );

        Self { store, images, sounds }
    }

    /// Preloaded image bytes for a logical key
    pub fn image(&self, key: &str) -> Option<&[u8]> {
        self.images.get(key).map(|b| b.as_slice())
    }

    /// Sound resource name for a logical key
    pub fn sound_resource(&self, key: &str) -> Option<&str> {
        self.sounds.get(key).map(|s| s.as_str())
    }

    /// Whether a sound mapping exists for the key (used for style fallback)
    pub fn has_sound(&self, key: &str) -> bool {
        self.sounds.contains_key(key)
    }

    /// Load the bytes behind a sound key from the backing store
    pub fn load_sound_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let name = self
            .sounds
            .get(key)
            .with_context(|| format!("No sound mapping for key '{}'", key))?;
        self.store.load(name)
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }
}
