//! Meme generation and playback controller
//!
//! Owns the ordered item list, the preloaded asset cache, and the single
//! playback slot. Every mutation republishes an immutable snapshot to
//! [`SharedMemeState`] and notifies subscribers, so the widget layer only
//! ever polls or receives events and never touches controller internals.
//!
//! Failure policy at this boundary is degrade-and-log: `generate_meme` and
//! `play_sound` never surface errors to the caller. The fallible paths are
//! typed internally so tests can assert on the degraded outcome.

use crate::assets::{AssetCache, AssetStore, DEFAULT_KEY};
use crate::data::{current_timestamp, LogLevel, MemeEvent, MemeItem, PlaybackSnapshot};
use crate::error::{MemeError, MemeResult};
use crate::player::AudioPlayer;
use crate::shared_state::SharedMemeState;
use crate::PromptKey;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Log-panel source tag for controller entries
const LOG_SOURCE: &str = "meme-controller";

/// Controller configuration
#[derive(Debug, Clone)]
pub struct MemeConfig {
    /// Directory for materialized media files
    pub temp_dir: PathBuf,
    /// Blink toggle period while an item is playing
    pub blink_interval: Duration,
    /// Capacity of the UI log feed
    pub max_log_entries: usize,
    /// Per-subscriber event queue capacity
    pub event_queue_size: usize,
}

impl Default for MemeConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            blink_interval: Duration::from_millis(500),
            max_log_entries: 200,
            event_queue_size: 100,
        }
    }
}

/// Playback slot state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    /// No item is playing
    Stopped,
    /// The item at `index` is playing
    Playing { index: usize, started_at: Instant },
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing { .. })
    }

    pub fn active_index(&self) -> Option<usize> {
        match self {
            PlaybackState::Playing { index, .. } => Some(*index),
            PlaybackState::Stopped => None,
        }
    }
}

/// Controller state behind one lock, so the item list and the blink flags
/// can never be observed out of lock-step
struct ControllerState {
    playback: PlaybackState,
    memes: Vec<MemeItem>,
    blinking: Vec<bool>,
}

/// Everything the background workers (blink loop, completion callback) need
struct Inner {
    state: RwLock<ControllerState>,
    /// Playback epoch, bumped on every transition. Workers capture the epoch
    /// of the session that spawned them and no-op once it goes stale.
    epoch: AtomicU64,
    shared: Arc<SharedMemeState>,
    subscribers: Mutex<Vec<Sender<MemeEvent>>>,
}

impl Inner {
    fn snapshot(state: &ControllerState) -> PlaybackSnapshot {
        PlaybackSnapshot {
            is_playing: state.playback.is_playing(),
            active_index: state.playback.active_index(),
            blinking: state.blinking.clone(),
        }
    }

    /// Republish the playback snapshot; call with the state lock held
    fn publish_snapshot(&self, state: &ControllerState) {
        self.shared.playback.set(Self::snapshot(state));
    }

    /// Deliver an event to every live subscriber, pruning dead ones
    fn publish(&self, event: MemeEvent) {
        let mut subs = self.subscribers.lock();
        subs.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Subscriber queue full, dropping event");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// Completion callback path: playback reached its natural end
    fn finish_playback(&self, session: u64, index: usize) {
        let mut state = self.state.write();
        if self.epoch.load(Ordering::SeqCst) != session {
            debug!("Ignoring stale completion for item {}", index);
            return;
        }
        if state.playback.active_index() != Some(index) {
            return;
        }

        self.epoch.fetch_add(1, Ordering::SeqCst);
        state.playback = PlaybackState::Stopped;
        if index < state.blinking.len() {
            state.blinking[index] = false;
        }
        self.publish_snapshot(&state);
        drop(state);

        info!("Playback finished for item {}", index);
        self.publish(MemeEvent::PlaybackStopped { index });
    }
}

/// Meme generation and playback controller
pub struct MemeController {
    cache: AssetCache,
    player: Arc<dyn AudioPlayer>,
    config: MemeConfig,
    inner: Arc<Inner>,
}

impl MemeController {
    /// Create a controller with default configuration, preloading the asset
    /// cache from `store`. Missing assets are logged; construction never
    /// fails because of them.
    pub fn new(store: Arc<dyn AssetStore>, player: Arc<dyn AudioPlayer>) -> Self {
        Self::with_config(store, player, MemeConfig::default())
    }

    /// Create a controller with custom configuration
    pub fn with_config(
        store: Arc<dyn AssetStore>,
        player: Arc<dyn AudioPlayer>,
        config: MemeConfig,
    ) -> Self {
        let cache = AssetCache::preload(store);
        let shared = SharedMemeState::new(config.max_log_entries);

        Self {
            cache,
            player,
            config,
            inner: Arc::new(Inner {
                state: RwLock::new(ControllerState {
                    playback: PlaybackState::Stopped,
                    memes: Vec::new(),
                    blinking: Vec::new(),
                }),
                epoch: AtomicU64::new(0),
                shared,
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Shared state handle for the polling UI
    pub fn shared_state(&self) -> Arc<SharedMemeState> {
        Arc::clone(&self.inner.shared)
    }

    /// Subscribe to state-change events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<MemeEvent> {
        let (tx, rx) = bounded(self.config.event_queue_size);
        self.inner.subscribers.lock().push(tx);
        rx
    }

    /// Generate a meme for `prompt` + `style` and append it to the list.
    ///
    /// Asset resolution is first-match-wins on the recognized prompt phrases;
    /// otherwise the default image with the style-selected (or default)
    /// sound. On any failure the call is a no-op: nothing is appended, the
    /// failure is logged and surfaced on the shared log feed.
    pub fn generate_meme(&self, prompt: &str, style: &str) {
        match self.try_generate(prompt, style) {
            Ok(index) => {
                info!("Generated meme {} for prompt '{}'", index, prompt);
                self.inner.publish(MemeEvent::Generated { index });
            }
            Err(e) => {
                warn!("Meme generation failed: {}", e);
                self.inner.shared.push_log(
                    LogLevel::Warn,
                    format!("Meme generation failed: {}", e),
                    LOG_SOURCE,
                );
            }
        }
    }

    fn try_generate(&self, prompt: &str, style: &str) -> MemeResult<usize> {
        let image_key = select_image_key(prompt);
        let sound_key = select_sound_key(&self.cache, prompt, style);
        debug!("Resolved prompt to image '{}', sound '{}'", image_key, sound_key);

        let image_bytes = self
            .cache
            .image(image_key)
            .ok_or_else(|| MemeError::AssetNotFound(format!("image '{}'", image_key)))?;
        let sound_bytes = self
            .cache
            .load_sound_bytes(sound_key)
            .map_err(|e| MemeError::AssetNotFound(format!("sound '{}': {}", sound_key, e)))?;

        let image_path = write_temp_file(&self.config.temp_dir, image_bytes, "jpeg")?;
        let sound_path = write_temp_file(&self.config.temp_dir, &sound_bytes, "mp3")?;

        let item = MemeItem {
            image_path,
            text: prompt.to_string(),
            sound_path,
            created_at: current_timestamp(),
        };

        // Item list and blink flags grow in lock-step, under one lock
        let mut state = self.inner.state.write();
        state.memes.push(item);
        state.blinking.push(false);
        let index = state.memes.len() - 1;
        self.inner.shared.memes.set(state.memes.clone());
        self.inner.publish_snapshot(&state);
        drop(state);

        Ok(index)
    }

    /// Toggle playback for the item at `index`, playing from `path`.
    ///
    /// - Stopped: starts playback and the blink loop.
    /// - Playing the same index: stops.
    /// - Playing a different index: stops the current stream first, then
    ///   starts the new one, so at most one item is ever active.
    ///
    /// Playback errors are logged and leave the controller Stopped.
    pub fn play_sound(&self, path: &Path, index: usize) {
        let active = self.inner.state.read().playback.active_index();
        match active {
            Some(current) if current == index => self.stop_playback(current),
            Some(current) => {
                self.stop_playback(current);
                self.start_playback(path, index);
            }
            None => self.start_playback(path, index),
        }
    }

    fn stop_playback(&self, index: usize) {
        self.player.stop();

        let mut state = self.inner.state.write();
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        state.playback = PlaybackState::Stopped;
        if index < state.blinking.len() {
            state.blinking[index] = false;
        }
        self.inner.publish_snapshot(&state);
        drop(state);

        info!("Playback stopped for item {}", index);
        self.inner.publish(MemeEvent::PlaybackStopped { index });
    }

    fn start_playback(&self, path: &Path, index: usize) {
        {
            let state = self.inner.state.read();
            if index >= state.memes.len() {
                warn!(
                    "play_sound index {} out of range ({} items)",
                    index,
                    state.memes.len()
                );
                return;
            }
        }

        // Transition before starting the stream, so a completion from an
        // ultra-short file cannot race ahead of the state change
        let session;
        {
            let mut state = self.inner.state.write();
            session = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            state.playback = PlaybackState::Playing {
                index,
                started_at: Instant::now(),
            };
            state.blinking[index] = true;
            self.inner.publish_snapshot(&state);
        }

        let inner = Arc::clone(&self.inner);
        let on_finished = Box::new(move || inner.finish_playback(session, index));

        match self.player.start(path, on_finished) {
            Ok(()) => {
                self.inner.publish(MemeEvent::PlaybackStarted { index });
                self.spawn_blink_worker(session, index);
            }
            Err(e) => {
                error!("Failed to start playback for item {}: {}", index, e);
                self.inner.shared.push_log(
                    LogLevel::Error,
                    format!("Playback failed: {}", e),
                    LOG_SOURCE,
                );
                // Roll back to Stopped so the UI never sticks on a phantom
                // "playing" row
                let mut state = self.inner.state.write();
                self.inner.epoch.fetch_add(1, Ordering::SeqCst);
                state.playback = PlaybackState::Stopped;
                state.blinking[index] = false;
                self.inner.publish_snapshot(&state);
            }
        }
    }

    /// Periodic blink worker, scoped to one playback session. The starting
    /// transition turns the flag on; each tick re-checks that the captured
    /// epoch is still current before flipping, so the loop exits on its own
    /// once the state diverges. Forces the flag off on the way out.
    fn spawn_blink_worker(&self, session: u64, index: usize) {
        let inner = Arc::clone(&self.inner);
        let interval = self.config.blink_interval;

        thread::spawn(move || {
            debug!("Blink worker started for item {}", index);
            loop {
                thread::sleep(interval);

                let mut state = inner.state.write();
                let still_current = inner.epoch.load(Ordering::SeqCst) == session
                    && state.playback.active_index() == Some(index);
                if !still_current {
                    break;
                }

                state.blinking[index] = !state.blinking[index];
                let on = state.blinking[index];
                inner.publish_snapshot(&state);
                drop(state);
                inner.publish(MemeEvent::BlinkTick { index, on });
            }

            // The stopping transition usually cleared the flag already; only
            // notify when this actually changes something.
            let mut state = inner.state.write();
            if index < state.blinking.len() && state.blinking[index] {
                state.blinking[index] = false;
                inner.publish_snapshot(&state);
                drop(state);
                inner.publish(MemeEvent::BlinkTick { index, on: false });
            }
            debug!("Blink worker ended for item {}", index);
        });
    }

    /// Current blink flag for the item at `index`.
    ///
    /// Panics if `index` is out of range; callers are expected to index
    /// within the list they render.
    pub fn is_meme_blinking(&self, index: usize) -> bool {
        self.inner.state.read().blinking[index]
    }

    pub fn is_playing(&self) -> bool {
        self.inner.state.read().playback.is_playing()
    }

    pub fn playing_index(&self) -> Option<usize> {
        self.inner.state.read().playback.active_index()
    }

    /// Snapshot of the generated items, in creation order
    pub fn memes(&self) -> Vec<MemeItem> {
        self.inner.state.read().memes.clone()
    }

    pub fn meme_count(&self) -> usize {
        self.inner.state.read().memes.len()
    }

    /// Controller statistics as JSON, for diagnostics panels
    pub fn stats(&self) -> serde_json::Value {
        let state = self.inner.state.read();
        let playing_for_ms = match &state.playback {
            PlaybackState::Playing { started_at, .. } => {
                Some(started_at.elapsed().as_millis() as u64)
            }
            PlaybackState::Stopped => None,
        };

        json!({
            "memes_generated": state.memes.len(),
            "is_playing": state.playback.is_playing(),
            "active_index": state.playback.active_index(),
            "playing_for_ms": playing_for_ms,
            "cached_images": self.cache.image_count(),
            "sound_mappings": self.cache.sound_count(),
        })
    }
}

impl Drop for MemeController {
    fn drop(&mut self) {
        let mut state = self.inner.state.write();
        if state.playback.is_playing() {
            self.player.stop();
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            state.playback = PlaybackState::Stopped;
        }
    }
}

/// Image key for a prompt: first recognized phrase wins, else the default
fn select_image_key(prompt: &str) -> &'static str {
    PromptKey::from_prompt(prompt)
        .map(|key| key.asset_key())
        .unwrap_or(DEFAULT_KEY)
}

/// Sound key for a prompt + style: a recognized phrase overrides the style;
/// otherwise the style if it has a mapping, else the default
fn select_sound_key<'a>(cache: &AssetCache, prompt: &str, style: &'a str) -> &'a str {
    if let Some(key) = PromptKey::from_prompt(prompt) {
        key.asset_key()
    } else if cache.has_sound(style) {
        style
    } else {
        DEFAULT_KEY
    }
}

/// Write bytes to a fresh timestamp-named file under `dir`
fn write_temp_file(dir: &Path, bytes: &[u8], ext: &str) -> MemeResult<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| MemeError::FileWrite(format!("{}: {}", dir.display(), e)))?;

    let stamp = current_timestamp();
    let mut path = dir.join(format!("{}.{}", stamp, ext));
    // Millisecond stamps can collide within one burst of generates
    let mut n = 1;
    while path.exists() {
        path = dir.join(format!("{}-{}.{}", stamp, n, ext));
        n += 1;
    }

    std::fs::write(&path, bytes)
        .map_err(|e| MemeError::FileWrite(format!("{}: {}", path.display(), e)))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetStore;
    use crate::player::MockPlayer;

    /// Store with distinct bytes per asset so selection is observable in the
    /// materialized files
    fn scenario_store() -> MemoryAssetStore {
        let mut store = MemoryAssetStore::new();
        store.insert("img1.jpeg", b"image-chris".to_vec());
        store.insert("img3.jpeg", b"image-stardust".to_vec());
        store.insert("img4.jpeg", b"image-default".to_vec());
        store.insert("hip_hop.mp3", b"sound-hiphop".to_vec());
        store.insert("classic.mp3", b"sound-classic".to_vec());
        store.insert("dancing_in_the_start_dust.mp3", b"sound-stardust".to_vec());
        store.insert("chris_with_you_my_love.mp3", b"sound-chris".to_vec());
        store
    }

    fn test_config(name: &str) -> MemeConfig {
        MemeConfig {
            temp_dir: std::env::temp_dir().join(format!("meme_bridge_test_{}", name)),
            // Long enough that asserts right after a transition run before
            // the first tick
            blink_interval: Duration::from_millis(200),
            ..Default::default()
        }
    }

    fn test_controller(name: &str) -> (MemeController, Arc<MockPlayer>) {
        let player = Arc::new(MockPlayer::new());
        let controller = MemeController::with_config(
            Arc::new(scenario_store()),
            player.clone(),
            test_config(name),
        );
        (controller, player)
    }

    fn cleanup(name: &str) {
        std::fs::remove_dir_all(std::env::temp_dir().join(format!("meme_bridge_test_{}", name)))
            .ok();
    }

    fn drain(rx: &Receiver<MemeEvent>) -> Vec<MemeEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_image_selection_chain() {
        assert_eq!(
            select_image_key("dancing in the start dust tonight"),
            "dancing in the start dust"
        );
        assert_eq!(
            select_image_key("oh chris with you my love forever"),
            "chris with you my love"
        );
        assert_eq!(select_image_key("hello world"), DEFAULT_KEY);
    }

    #[test]
    fn test_sound_selection_prompt_key_ignores_style() {
        let cache = AssetCache::preload(Arc::new(scenario_store()));
        assert_eq!(
            select_sound_key(&cache, "dancing in the start dust", "classic"),
            "dancing in the start dust"
        );
        assert_eq!(select_sound_key(&cache, "hello world", "classic"), "classic");
        assert_eq!(
            select_sound_key(&cache, "hello world", "unknown-style"),
            DEFAULT_KEY
        );
    }

    #[test]
    fn test_generate_scenario_star_dust() {
        let (controller, _player) = test_controller("stardust");
        controller.generate_meme("dancing in the start dust", "classic");

        let memes = controller.memes();
        assert_eq!(memes.len(), 1);
        assert_eq!(memes[0].text, "dancing in the start dust");
        // The style was ignored: the prompt-matched sound was materialized
        let sound = std::fs::read(&memes[0].sound_path).unwrap();
        assert_eq!(sound, b"sound-stardust");
        let image = std::fs::read(&memes[0].image_path).unwrap();
        assert_eq!(image, b"image-stardust");

        cleanup("stardust");
    }

    #[test]
    fn test_generate_scenario_style_fallbacks() {
        let (controller, _player) = test_controller("fallbacks");
        controller.generate_meme("hello world", "classic");
        controller.generate_meme("hello world", "unknown-style");

        let memes = controller.memes();
        assert_eq!(memes.len(), 2);
        assert_eq!(std::fs::read(&memes[0].sound_path).unwrap(), b"sound-classic");
        assert_eq!(std::fs::read(&memes[0].image_path).unwrap(), b"image-default");
        assert_eq!(std::fs::read(&memes[1].sound_path).unwrap(), b"sound-hiphop");

        cleanup("fallbacks");
    }

    #[test]
    fn test_generate_grows_items_and_flags_in_lockstep() {
        let (controller, _player) = test_controller("lockstep");
        let events = controller.subscribe();

        controller.generate_meme("hello world", "classic");
        controller.generate_meme("another one", "hip hop");

        assert_eq!(controller.meme_count(), 2);
        let snapshot = controller.shared_state().playback.read();
        assert_eq!(snapshot.blinking.len(), 2);
        assert!(snapshot.blinking.iter().all(|b| !b));
        assert!(!controller.is_meme_blinking(0));
        assert!(!controller.is_meme_blinking(1));

        let events = drain(&events);
        assert!(events.contains(&MemeEvent::Generated { index: 0 }));
        assert!(events.contains(&MemeEvent::Generated { index: 1 }));

        // The materialized files carry the expected suffixes
        let memes = controller.memes();
        assert!(memes[0].image_path.extension().unwrap() == "jpeg");
        assert!(memes[0].sound_path.extension().unwrap() == "mp3");

        cleanup("lockstep");
    }

    #[test]
    fn test_generate_failure_is_noop() {
        // Empty store: preload logs failures, generation degrades to a no-op
        let player = Arc::new(MockPlayer::new());
        let controller = MemeController::with_config(
            Arc::new(MemoryAssetStore::new()),
            player,
            test_config("gen_fail"),
        );

        controller.generate_meme("hello world", "classic");

        assert_eq!(controller.meme_count(), 0);
        let logs = controller.shared_state().logs.read();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].message.contains("generation failed"));

        cleanup("gen_fail");
    }

    #[test]
    fn test_generate_unwritable_temp_dir_is_noop() {
        // Point temp_dir below a regular file so directory creation fails
        let blocker = std::env::temp_dir().join("meme_bridge_test_blocker_file");
        std::fs::write(&blocker, b"x").unwrap();

        let player = Arc::new(MockPlayer::new());
        let config = MemeConfig {
            temp_dir: blocker.join("sub"),
            ..test_config("unwritable")
        };
        let controller =
            MemeController::with_config(Arc::new(scenario_store()), player, config);

        controller.generate_meme("hello world", "classic");
        assert_eq!(controller.meme_count(), 0);

        std::fs::remove_file(&blocker).ok();
    }

    #[test]
    fn test_play_toggles_same_index() {
        let (controller, player) = test_controller("toggle");
        controller.generate_meme("hello world", "classic");
        let sound_path = controller.memes()[0].sound_path.clone();

        controller.play_sound(&sound_path, 0);
        assert!(controller.is_playing());
        assert_eq!(controller.playing_index(), Some(0));
        assert!(controller.is_meme_blinking(0));
        assert_eq!(player.started_paths(), vec![sound_path.clone()]);

        controller.play_sound(&sound_path, 0);
        assert!(!controller.is_playing());
        assert_eq!(controller.playing_index(), None);
        assert!(!controller.is_meme_blinking(0));
        assert!(player.stop_count() >= 1);

        let snapshot = controller.shared_state().playback.read();
        assert!(!snapshot.is_playing);
        assert!(snapshot.active_index.is_none());

        cleanup("toggle");
    }

    #[test]
    fn test_play_different_index_stops_then_starts() {
        let (controller, player) = test_controller("switch");
        controller.generate_meme("hello world", "classic");
        controller.generate_meme("second", "hip hop");
        let memes = controller.memes();

        controller.play_sound(&memes[0].sound_path, 0);
        controller.play_sound(&memes[1].sound_path, 1);

        // Single active item: the old stream was stopped before the new start
        assert_eq!(controller.playing_index(), Some(1));
        assert!(player.stop_count() >= 1);
        assert_eq!(
            player.started_paths(),
            vec![memes[0].sound_path.clone(), memes[1].sound_path.clone()]
        );
        assert!(!controller.is_meme_blinking(0));
        assert!(controller.is_meme_blinking(1));

        cleanup("switch");
    }

    #[test]
    fn test_natural_completion_transitions_to_stopped() {
        let (controller, player) = test_controller("finish");
        controller.generate_meme("hello world", "classic");
        let sound_path = controller.memes()[0].sound_path.clone();
        let events = controller.subscribe();

        controller.play_sound(&sound_path, 0);
        assert!(player.finish_current());

        assert!(!controller.is_playing());
        assert!(!controller.is_meme_blinking(0));
        assert!(drain(&events).contains(&MemeEvent::PlaybackStopped { index: 0 }));

        cleanup("finish");
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let (controller, player) = test_controller("stale");
        controller.generate_meme("hello world", "classic");
        let sound_path = controller.memes()[0].sound_path.clone();

        controller.play_sound(&sound_path, 0);
        let stale_callback = player.take_callback().expect("a stream should be pending");

        // Toggle off: the captured session is now stale
        controller.play_sound(&sound_path, 0);
        assert!(!controller.is_playing());

        // Restart, then fire the stale completion: it must not kill the new session
        controller.play_sound(&sound_path, 0);
        stale_callback();
        assert!(controller.is_playing());
        assert_eq!(controller.playing_index(), Some(0));

        cleanup("stale");
    }

    #[test]
    fn test_start_failure_leaves_stopped() {
        let (controller, player) = test_controller("start_fail");
        controller.generate_meme("hello world", "classic");
        let sound_path = controller.memes()[0].sound_path.clone();

        player.fail_next_start();
        controller.play_sound(&sound_path, 0);

        assert!(!controller.is_playing());
        assert!(!controller.is_meme_blinking(0));
        let logs = controller.shared_state().logs.read();
        assert!(logs.iter().any(|l| l.message.contains("Playback failed")));

        cleanup("start_fail");
    }

    #[test]
    fn test_play_sound_out_of_range_is_noop() {
        let (controller, player) = test_controller("oob");
        controller.play_sound(Path::new("/tmp/nothing.mp3"), 5);
        assert!(!controller.is_playing());
        assert!(player.started_paths().is_empty());
        cleanup("oob");
    }

    #[test]
    fn test_blink_toggles_while_playing() {
        let player = Arc::new(MockPlayer::new());
        let config = MemeConfig {
            blink_interval: Duration::from_millis(10),
            ..test_config("blink")
        };
        let controller =
            MemeController::with_config(Arc::new(scenario_store()), player, config);
        controller.generate_meme("hello world", "classic");
        controller.generate_meme("second", "classic");
        let sound_path = controller.memes()[0].sound_path.clone();
        let events = controller.subscribe();

        controller.play_sound(&sound_path, 0);
        thread::sleep(Duration::from_millis(100));

        // At a 10ms interval, several ticks must have landed by now
        let ticks: Vec<_> = drain(&events)
            .into_iter()
            .filter(|e| matches!(e, MemeEvent::BlinkTick { .. }))
            .collect();
        assert!(ticks.len() >= 3, "expected blink ticks, got {:?}", ticks);
        assert!(ticks
            .iter()
            .all(|e| matches!(e, MemeEvent::BlinkTick { index: 0, .. })));

        // The non-active item never blinks
        assert!(!controller.is_meme_blinking(1));

        // Stopping ends the loop and forces the flag off
        controller.play_sound(&sound_path, 0);
        thread::sleep(Duration::from_millis(50));
        assert!(!controller.is_meme_blinking(0));

        let _ = drain(&events);
        thread::sleep(Duration::from_millis(50));
        assert!(
            drain(&events)
                .iter()
                .all(|e| !matches!(e, MemeEvent::BlinkTick { on: true, .. })),
            "no blink-on ticks after stop"
        );

        cleanup("blink");
    }

    #[test]
    fn test_snapshot_invariant_holds() {
        let (controller, _player) = test_controller("invariant");
        controller.generate_meme("hello world", "classic");
        let sound_path = controller.memes()[0].sound_path.clone();

        let check = |snapshot: PlaybackSnapshot| {
            assert_eq!(snapshot.is_playing, snapshot.active_index.is_some());
        };

        check(controller.shared_state().playback.read());
        controller.play_sound(&sound_path, 0);
        check(controller.shared_state().playback.read());
        controller.play_sound(&sound_path, 0);
        check(controller.shared_state().playback.read());

        cleanup("invariant");
    }

    #[test]
    fn test_stats_reports_counts() {
        let (controller, _player) = test_controller("stats");
        controller.generate_meme("hello world", "classic");

        let stats = controller.stats();
        assert_eq!(stats["memes_generated"], 1);
        assert_eq!(stats["is_playing"], false);
        assert_eq!(stats["cached_images"], 3);
        assert_eq!(stats["sound_mappings"], 5);

        cleanup("stats");
    }

    #[test]
    fn test_temp_file_names_do_not_collide() {
        let dir = std::env::temp_dir().join("meme_bridge_test_collide");
        let a = write_temp_file(&dir, b"a", "jpeg").unwrap();
        let b = write_temp_file(&dir, b"b", "jpeg").unwrap();
        assert_ne!(a, b);
        assert_eq!(std::fs::read(&a).unwrap(), b"a");
        assert_eq!(std::fs::read(&b).unwrap(), b"b");
        std::fs::remove_dir_all(&dir).ok();
    }
}
