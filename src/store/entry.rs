//! Store Entry Module
//!
//! A single value held by the in-process store, with optional expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Store Entry ==
/// Represents a single stored value with its expiry metadata.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// The stored value, always kept as a string like the hosted store does
    pub value: String,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates a new entry that expires `ttl` from now, or never.
    pub fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| current_timestamp_ms() + ttl.as_millis() as u64),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Expire ==
    /// Resets the expiry to `ttl` from now.
    pub fn expire_in(&mut self, ttl: Duration) {
        self.expires_at = Some(current_timestamp_ms() + ttl.as_millis() as u64);
    }

    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
