//! In-process Store Module
//!
//! HashMap-backed key-value store with per-entry TTL and LRU eviction of
//! expiring keys. Behaves like the hosted store for the commands the gateway
//! uses, so it doubles as a local development backend and a test fake.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::store::{KvStore, RecencyTracker, StoreEntry, MAX_KEY_LENGTH, MAX_VALUE_SIZE};

// == Store State ==
#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, StoreEntry>,
    lru: RecencyTracker,
}

impl State {
    /// Returns the live entry for `key`, dropping it first if it has expired.
    fn live(&mut self, key: &str) -> Option<&mut StoreEntry> {
        if self.entries.get(key).is_some_and(StoreEntry::is_expired) {
            self.entries.remove(key);
            self.lru.forget(key);
        }
        self.entries.get_mut(key)
    }

    /// Makes room for one more key.
    ///
    /// Only keys with an expiry are evicted; persistent keys such as
    /// namespace version counters are never dropped for capacity.
    fn make_room(&mut self, max_entries: usize) -> Result<()> {
        while self.entries.len() >= max_entries {
            let entries = &self.entries;
            let Some(victim) = self
                .lru
                .pop_stalest(|k| entries.get(k).is_some_and(|e| e.expires_at.is_none()))
            else {
                return Err(AppError::Store(
                    "store is full and holds no evictable keys".to_string(),
                ));
            };
            self.entries.remove(&victim);
        }
        Ok(())
    }

    fn insert(&mut self, key: &str, entry: StoreEntry, max_entries: usize) -> Result<()> {
        if !self.entries.contains_key(key) {
            self.make_room(max_entries)?;
        }
        self.entries.insert(key.to_string(), entry);
        self.lru.touch(key);
        Ok(())
    }
}

// == Memory Store ==
/// In-process key-value store.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<State>,
    max_entries: usize,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            state: RwLock::new(State::default()),
            max_entries: max_entries.max(1),
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        let mut state = self.state.write().await;
        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.entries.remove(key);
            state.lru.forget(key);
        }
        expired.len()
    }

    /// Number of keys currently held, including not-yet-swept expired ones.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remaining TTL of `key` in milliseconds, if it exists and expires.
    pub async fn pttl(&self, key: &str) -> Option<u64> {
        let mut state = self.state.write().await;
        state.live(key).and_then(|e| e.ttl_remaining_ms())
    }
}

fn validate(key: &str, value: &str) -> Result<()> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(AppError::InvalidRequest(format!(
            "Key must be 1 to {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if value.len() > MAX_VALUE_SIZE {
        return Err(AppError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut state = self.state.write().await;
        let value = state.live(key).map(|e| e.value.clone());
        if value.is_some() {
            state.lru.touch(key);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        validate(key, value)?;
        let mut state = self.state.write().await;
        state.live(key);
        state.insert(key, StoreEntry::new(value.to_string(), ttl), self.max_entries)
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let existed = state.live(key).is_some();
        state.entries.remove(key);
        state.lru.forget(key);
        Ok(existed)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        validate(key, "")?;
        let mut state = self.state.write().await;
        match state.live(key) {
            Some(entry) => {
                let current: i64 = entry.value.parse().map_err(|_| {
                    AppError::Store("value is not an integer or out of range".to_string())
                })?;
                let next = current
                    .checked_add(1)
                    .ok_or_else(|| AppError::Store("increment would overflow".to_string()))?;
                entry.value = next.to_string();
                state.lru.touch(key);
                Ok(next)
            }
            None => {
                state.insert(key, StoreEntry::new("1".to_string(), None), self.max_entries)?;
                Ok(1)
            }
        }
    }

    async fn pexpire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.live(key) {
            Some(entry) => {
                entry.expire_in(ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
