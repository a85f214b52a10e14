//! Bounded undo history.

use std::collections::VecDeque;
use std::path::PathBuf;

use crate::snapshot::GameStateSnapshot;

/// One undo step: the story that was active and the state inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Id of the story that was loaded.
    pub story_id: String,
    /// File the story was read from.
    pub story_path: PathBuf,
    /// Game state before the step.
    pub state: GameStateSnapshot,
}

/// A stack of snapshots holding at most `capacity` entries.
///
/// Pushing onto a full history drops the oldest entry.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(50)
    }
}

impl UndoHistory {
    /// An empty history. A capacity of zero disables undo.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    /// Add an entry, evicting the oldest when full.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Remove and return the most recent entry.
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
