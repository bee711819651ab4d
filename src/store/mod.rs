//! Store Module
//!
//! The key-value store seam behind the response cache and the rate limiter,
//! with an in-process implementation and a hosted REST client.

mod entry;
mod lru;
mod memory;
mod rest;

#[cfg(test)]
mod property_tests;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{Config, KvBackend};
use crate::error::Result;

// Re-export public types
pub use entry::{current_timestamp_ms, StoreEntry};
pub use lru::RecencyTracker;
pub use memory::MemoryStore;
pub use rest::RestStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 1024;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

// == Store Trait ==
/// The subset of Redis commands the gateway relies on.
///
/// Atomicity of `incr` and expiry are delegated to the implementation.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the value at `key`, or None if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` at `key`, replacing any previous value and expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Deletes `key`, returning whether it existed.
    async fn del(&self, key: &str) -> Result<bool>;

    /// Atomically increments the integer at `key` (absent counts as 0).
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Sets an expiry on an existing key, returning whether the key existed.
    async fn pexpire(&self, key: &str, ttl: Duration) -> Result<bool>;
}

// == Store Mode ==
/// The store strategy resolved once at startup.
#[derive(Clone)]
pub enum StoreMode {
    /// A store is configured; caching and rate limiting use it.
    Connected(Arc<dyn KvStore>),
    /// No store; caching computes directly and rate limiting always allows.
    Disabled,
}

impl StoreMode {
    pub fn connected<S: KvStore + 'static>(store: Arc<S>) -> Self {
        Self::Connected(store)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Resolves the store from configuration.
    ///
    /// Returns the in-process store separately when it is selected, so the
    /// caller can schedule its expiry sweep.
    pub fn from_config(config: &Config) -> (Self, Option<Arc<MemoryStore>>) {
        match config.kv_backend {
            KvBackend::Rest => match (&config.kv_rest_url, &config.kv_rest_token) {
                (Some(url), Some(token)) => {
                    info!(url = %url, "Using hosted key-value store");
                    (Self::connected(Arc::new(RestStore::new(url, token))), None)
                }
                _ => {
                    warn!("KV_REST_URL or KV_REST_TOKEN missing; caching and rate limiting bypassed");
                    (Self::Disabled, None)
                }
            },
            KvBackend::Memory => {
                info!(max_entries = config.memory_max_entries, "Using in-process key-value store");
                let store = Arc::new(MemoryStore::new(config.memory_max_entries));
                (Self::connected(store.clone()), Some(store))
            }
            KvBackend::None => {
                warn!("No key-value store configured; caching and rate limiting bypassed");
                (Self::Disabled, None)
            }
        }
    }
}

impl std::fmt::Debug for StoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(_) => f.write_str("StoreMode::Connected"),
            Self::Disabled => f.write_str("StoreMode::Disabled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_disable_store() {
        let config = Config {
            kv_backend: KvBackend::Rest,
            kv_rest_url: Some("https://kv.example.com".to_string()),
            kv_rest_token: None,
            ..Config::default()
        };

        let (mode, memory) = StoreMode::from_config(&config);
        assert!(!mode.is_connected());
        assert!(memory.is_none());
    }

    #[test]
    fn test_memory_backend_is_connected() {
        let config = Config {
            kv_backend: KvBackend::Memory,
            ..Config::default()
        };

        let (mode, memory) = StoreMode::from_config(&config);
        assert!(mode.is_connected());
        assert!(memory.is_some());
    }

    #[test]
    fn test_rest_backend_with_credentials() {
        let config = Config {
            kv_backend: KvBackend::Rest,
            kv_rest_url: Some("https://kv.example.com".to_string()),
            kv_rest_token: Some("secret".to_string()),
            ..Config::default()
        };

        let (mode, memory) = StoreMode::from_config(&config);
        assert!(mode.is_connected());
        assert!(memory.is_none());
    }
}
