//! Audio playback backends
//!
//! The controller talks to playback through the [`AudioPlayer`] trait: start
//! one stream from a file path with a completion callback, or stop whatever
//! is playing. [`RodioPlayer`] is the real backend; [`MockPlayer`] supports
//! testing without an audio device.

use crate::error::{MemeError, MemeResult};
use crossbeam_channel::{bounded, unbounded, Sender};
use parking_lot::Mutex;
use rodio::{Decoder, OutputStreamBuilder, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Callback fired exactly once when a stream plays to its natural end.
/// Not fired when the stream is preempted by `stop` or a newer `start`.
pub type FinishedCallback = Box<dyn FnOnce() + Send + 'static>;

/// Single-stream audio playback
pub trait AudioPlayer: Send + Sync {
    /// Begin playback from `path`. Any stream already playing is preempted
    /// without firing its callback.
    fn start(&self, path: &Path, on_finished: FinishedCallback) -> MemeResult<()>;

    /// Stop the current stream, if any. The pending callback is discarded.
    fn stop(&self);
}

enum PlayerCmd {
    Play {
        source: Decoder<BufReader<File>>,
        on_finished: FinishedCallback,
    },
    Stop,
    Shutdown,
}

/// Rodio-backed player
///
/// The output device is owned by a dedicated worker thread; commands arrive
/// over a channel. A small watcher thread per stream blocks on the sink and
/// fires the completion callback unless the stream was preempted.
pub struct RodioPlayer {
    cmd_sender: Sender<PlayerCmd>,
    worker_handle: Option<thread::JoinHandle<()>>,
}

impl RodioPlayer {
    /// Open the default output device and start the worker
    pub fn new() -> MemeResult<Self> {
        let (cmd_tx, cmd_rx) = unbounded();
        let (init_tx, init_rx) = bounded(1);

        let handle = thread::spawn(move || {
            let stream = match OutputStreamBuilder::open_default_stream() {
                Ok(s) => {
                    let _ = init_tx.send(Ok(()));
                    s
                }
                Err(e) => {
                    let _ = init_tx.send(Err(e.to_string()));
                    return;
                }
            };

            // Current stream: the sink plus its preemption flag. Setting the
            // flag before stopping the sink keeps the watcher from firing the
            // callback for a stream we killed.
            let mut current: Option<(Arc<Sink>, Arc<AtomicBool>)> = None;

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    PlayerCmd::Play { source, on_finished } => {
                        if let Some((sink, preempted)) = current.take() {
                            preempted.store(true, Ordering::SeqCst);
                            sink.stop();
                        }

                        let sink = Arc::new(Sink::connect_new(stream.mixer()));
                        sink.append(source);

                        let preempted = Arc::new(AtomicBool::new(false));
                        let watcher_sink = Arc::clone(&sink);
                        let watcher_flag = Arc::clone(&preempted);
                        thread::spawn(move || {
                            watcher_sink.sleep_until_end();
                            if watcher_flag.load(Ordering::SeqCst) {
                                debug!("Stream preempted, skipping completion callback");
                            } else {
                                debug!("Stream played to end, firing completion callback");
                                on_finished();
                            }
                        });

                        current = Some((sink, preempted));
                    }
                    PlayerCmd::Stop => {
                        if let Some((sink, preempted)) = current.take() {
                            preempted.store(true, Ordering::SeqCst);
                            sink.stop();
                            debug!("Playback stopped");
                        }
                    }
                    PlayerCmd::Shutdown => {
                        if let Some((sink, preempted)) = current.take() {
                            preempted.store(true, Ordering::SeqCst);
                            sink.stop();
                        }
                        break;
                    }
                }
            }

            info!("Audio worker ended");
        });

        match init_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => Ok(Self {
                cmd_sender: cmd_tx,
                worker_handle: Some(handle),
            }),
            Ok(Err(msg)) => Err(MemeError::DeviceUnavailable(msg)),
            Err(_) => Err(MemeError::DeviceUnavailable(
                "Audio worker did not initialize".to_string(),
            )),
        }
    }
}

impl AudioPlayer for RodioPlayer {
    fn start(&self, path: &Path, on_finished: FinishedCallback) -> MemeResult<()> {
        // Open and decode on the caller thread so failures surface here
        let file = File::open(path)
            .map_err(|e| MemeError::Playback(format!("Failed to open {}: {}", path.display(), e)))?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| MemeError::Playback(format!("Failed to decode {}: {}", path.display(), e)))?;

        self.cmd_sender
            .send(PlayerCmd::Play { source, on_finished })
            .map_err(|_| MemeError::ChannelSendError)?;

        info!("Playback started: {}", path.display());
        Ok(())
    }

    fn stop(&self) {
        if self.cmd_sender.send(PlayerCmd::Stop).is_err() {
            error!("Audio worker is gone, cannot stop");
        }
    }
}

impl Drop for RodioPlayer {
    fn drop(&mut self) {
        let _ = self.cmd_sender.send(PlayerCmd::Shutdown);

        if let Some(handle) = self.worker_handle.take() {
            // Wait with timeout to avoid blocking indefinitely
            let timeout = Duration::from_secs(2);
            let start = std::time::Instant::now();

            loop {
                if start.elapsed() > timeout {
                    warn!("Audio worker shutdown timeout after {:?}", timeout);
                    break;
                }

                if handle.is_finished() {
                    let _ = handle.join();
                    break;
                }

                thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

#[derive(Default)]
struct MockPlayerState {
    started: Vec<PathBuf>,
    stop_calls: usize,
    pending: Option<FinishedCallback>,
    fail_next_start: bool,
}

/// Mock player for testing without an audio device
///
/// Records calls and lets the test fire the completion callback manually.
#[derive(Default)]
pub struct MockPlayer {
    state: Mutex<MockPlayerState>,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `start` call fail
    pub fn fail_next_start(&self) {
        self.state.lock().fail_next_start = true;
    }

    /// Paths passed to `start`, in call order
    pub fn started_paths(&self) -> Vec<PathBuf> {
        self.state.lock().started.clone()
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().stop_calls
    }

    /// Whether a stream is "playing" (a callback is pending)
    pub fn has_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// Take the pending callback without firing it, so a test can replay it
    /// later as a stale completion
    pub fn take_callback(&self) -> Option<FinishedCallback> {
        self.state.lock().pending.take()
    }

    /// Simulate the current stream reaching its natural end.
    /// Returns false if nothing was playing.
    pub fn finish_current(&self) -> bool {
        let callback = self.state.lock().pending.take();
        match callback {
            Some(cb) => {
                cb();
                true
            }
            None => false,
        }
    }
}

impl AudioPlayer for MockPlayer {
    fn start(&self, path: &Path, on_finished: FinishedCallback) -> MemeResult<()> {
        let mut state = self.state.lock();
        if state.fail_next_start {
            state.fail_next_start = false;
            return Err(MemeError::Playback("Mock start failure".to_string()));
        }
        state.started.push(path.to_path_buf());
        // A newer start preempts the previous stream: its callback is dropped
        state.pending = Some(on_finished);
        Ok(())
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.stop_calls += 1;
        state.pending = None;
    }
}
