//! Thread-safe shared state with dirty tracking for efficient UI updates
//!
//! The controller writes snapshots here after every mutation; the UI reads
//! everything on one timer via `read_if_dirty`, so unchanged state costs a
//! single atomic load per poll. Collections are bounded to prevent memory
//! growth over long sessions.

use crate::data::{LogEntry, LogLevel, MemeItem, PlaybackSnapshot};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Generic dirty-trackable single value
pub struct DirtyValue<T: Clone> {
    value: RwLock<T>,
    dirty: AtomicBool,
}

impl<T: Clone> DirtyValue<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
            dirty: AtomicBool::new(false),
        }
    }

    /// Current value, without clearing the dirty flag
    pub fn read(&self) -> T {
        self.value.read().clone()
    }

    /// Replace the value and mark it dirty
    pub fn set(&self, value: T) {
        *self.value.write() = value;
        self.dirty.store(true, Ordering::Release);
    }

    /// Value if it changed since the last call, clearing the flag
    pub fn read_if_dirty(&self) -> Option<T> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            Some(self.value.read().clone())
        } else {
            None
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

/// Generic dirty-trackable bounded collection
pub struct DirtyVec<T: Clone> {
    items: RwLock<Vec<T>>,
    dirty: AtomicBool,
    max_items: usize,
}

impl<T: Clone> DirtyVec<T> {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            dirty: AtomicBool::new(false),
            max_items,
        }
    }

    /// Append an item, dropping the oldest when over capacity
    pub fn push(&self, item: T) {
        let mut items = self.items.write();
        items.push(item);
        if items.len() > self.max_items {
            let overflow = items.len() - self.max_items;
            items.drain(..overflow);
        }
        self.dirty.store(true, Ordering::Release);
    }

    /// Full contents, without clearing the dirty flag
    pub fn read(&self) -> Vec<T> {
        self.items.read().clone()
    }

    /// Contents if changed since the last call, clearing the flag
    pub fn read_if_dirty(&self) -> Option<Vec<T>> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            Some(self.items.read().clone())
        } else {
            None
        }
    }

    /// Take everything, leaving the collection empty
    pub fn drain(&self) -> Vec<T> {
        self.dirty.store(false, Ordering::Release);
        std::mem::take(&mut *self.items.write())
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

/// Shared state container polled by the UI
///
/// - `playback`: immutable snapshot of the playback slot and blink flags
/// - `memes`: the generated item list, republished in full so item indices
///   stay stable for the widget
/// - `logs`: degraded-operation entries for the log panel
pub struct SharedMemeState {
    pub playback: DirtyValue<PlaybackSnapshot>,
    pub memes: DirtyValue<Vec<MemeItem>>,
    pub logs: DirtyVec<LogEntry>,
}

impl SharedMemeState {
    pub fn new(max_log_entries: usize) -> Arc<Self> {
        Arc::new(Self {
            playback: DirtyValue::new(PlaybackSnapshot::default()),
            memes: DirtyValue::new(Vec::new()),
            logs: DirtyVec::new(max_log_entries),
        })
    }

    /// Record a degraded operation for the UI log panel
    pub fn push_log(&self, level: LogLevel, message: impl Into<String>, source: &str) {
        self.logs.push(LogEntry::new(level, message, source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_value_flag_lifecycle() {
        let value = DirtyValue::new(0usize);
        assert!(value.read_if_dirty().is_none());

        value.set(7);
        assert!(value.is_dirty());
        assert_eq!(value.read_if_dirty(), Some(7));
        assert!(value.read_if_dirty().is_none());

        // Plain read does not clear the flag
        value.set(8);
        assert_eq!(value.read(), 8);
        assert!(value.is_dirty());
    }

    #[test]
    fn test_dirty_vec_bounded() {
        let vec = DirtyVec::new(3);
        for i in 0..5 {
            vec.push(i);
        }
        assert_eq!(vec.read(), vec![2, 3, 4]);
        assert_eq!(vec.len(), 3);
    }

    #[test]
    fn test_dirty_vec_drain_clears() {
        let vec = DirtyVec::new(10);
        vec.push("a");
        vec.push("b");
        assert_eq!(vec.drain(), vec!["a", "b"]);
        assert!(vec.is_empty());
        assert!(vec.read_if_dirty().is_none());
    }

    #[test]
    fn test_shared_state_log_feed() {
        let state = SharedMemeState::new(2);
        state.push_log(LogLevel::Warn, "first", "test");
        state.push_log(LogLevel::Warn, "second", "test");
        state.push_log(LogLevel::Error, "third", "test");

        let logs = state.logs.read_if_dirty().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].message, "second");
        assert_eq!(logs[1].message, "third");
    }
}
