//! Gateway Module
//!
//! Versioned read-through caching and sliding-window rate limiting on top of
//! the key-value store.
//!
//! A single [`Gateway`] is built at startup and shared by all request
//! handlers. It owns the resolved store strategy, the store failure policy,
//! the rate limiting switch and the in-process registry of limiters.

mod cache;
mod ratelimit;


use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::config::{Config, StoreFailurePolicy};
use crate::error::{AppError, Result};
use crate::store::{current_timestamp_ms, StoreMode};

pub use cache::{cache_key, version_key, CacheStatus, Cached};
pub use ratelimit::{
    client_identifier, parse_window, RateLimitInfo, RateLimitOptions, RateLimitOutcome,
    SlidingWindowLimiter,
};

/// Source of the current Unix time in milliseconds.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// `(prefix, limit, window)` of a registered limiter.
type LimiterKey = (String, u64, String);

// == Gateway ==
/// Shared cache and rate-limit context.
pub struct Gateway {
    store: StoreMode,
    failure_policy: StoreFailurePolicy,
    rate_limit_enabled: bool,
    limiters: RwLock<HashMap<LimiterKey, Arc<SlidingWindowLimiter>>>,
    clock: Clock,
}

impl Gateway {
    // == Constructor ==
    /// Creates a gateway over `store` with rate limiting enabled and
    /// store failures propagated.
    pub fn new(store: StoreMode) -> Self {
        Self {
            store,
            failure_policy: StoreFailurePolicy::default(),
            rate_limit_enabled: true,
            limiters: RwLock::new(HashMap::new()),
            clock: Arc::new(current_timestamp_ms),
        }
    }

    /// Creates a gateway from configuration and an already resolved store.
    pub fn from_config(config: &Config, store: StoreMode) -> Self {
        Self::new(store)
            .with_failure_policy(config.failure_policy)
            .with_rate_limiting(config.rate_limit_enabled)
    }

    pub fn with_failure_policy(mut self, policy: StoreFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_rate_limiting(mut self, enabled: bool) -> Self {
        self.rate_limit_enabled = enabled;
        self
    }

    /// Replaces the wall clock used for rate-limit windows.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn store(&self) -> &StoreMode {
        &self.store
    }

    pub fn rate_limit_enabled(&self) -> bool {
        self.rate_limit_enabled
    }

    fn now_ms(&self) -> u64 {
        (self.clock)()
    }

    /// Applies the failure policy to a store error raised mid-call.
    ///
    /// Returns Ok when the caller should continue as if no store were
    /// configured.
    fn tolerate(&self, operation: &str, err: AppError) -> Result<()> {
        match (self.failure_policy, err) {
            (StoreFailurePolicy::FailOpen, AppError::Store(message)) => {
                warn!(operation, error = %message, "store unavailable, bypassing");
                Ok(())
            }
            (_, err) => Err(err),
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("store", &self.store)
            .field("failure_policy", &self.failure_policy)
            .field("rate_limit_enabled", &self.rate_limit_enabled)
            .finish_non_exhaustive()
    }
}
