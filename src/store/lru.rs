//! Recency tracking for the in-process store.

use std::collections::VecDeque;

// == Recency Tracker ==
/// Orders store keys by last write or read so the stalest one can be dropped
/// when the store is full.
///
/// Front = most recently used, back = least recently used.
#[derive(Debug, Default)]
pub struct RecencyTracker {
    order: VecDeque<String>,
}

impl RecencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `key` to the most-recent position, inserting it if needed.
    pub fn touch(&mut self, key: &str) {
        self.forget(key);
        self.order.push_front(key.to_string());
    }

    pub fn forget(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    /// Pops the least recently used key, skipping keys `keep` protects.
    ///
    /// Returns None if every tracked key is protected.
    pub fn pop_stalest<F>(&mut self, keep: F) -> Option<String>
    where
        F: Fn(&str) -> bool,
    {
        let pos = self.order.iter().rposition(|k| !keep(k))?;
        self.order.remove(pos)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
