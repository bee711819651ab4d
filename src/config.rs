//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;

use crate::error::{AppError, Result};
use crate::gateway::parse_window;

// == Store Backend ==
/// Which key-value store backs the cache and rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvBackend {
    /// Hosted store reached over its REST interface
    Rest,
    /// In-process store, for local development
    Memory,
    /// No store: caching and rate limiting are bypassed
    None,
}

impl KvBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rest" => Some(Self::Rest),
            "memory" => Some(Self::Memory),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }
}

// == Store Failure Policy ==
/// What to do when a configured store fails during a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreFailurePolicy {
    /// Log the failure and serve the call as if no store were configured
    FailOpen,
    /// Surface the store error to the caller
    #[default]
    FailClosed,
}

impl StoreFailurePolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::FailOpen),
            "closed" => Some(Self::FailClosed),
            _ => None,
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Global rate limiting switch
    pub rate_limit_enabled: bool,
    /// REST endpoint of the hosted key-value store
    pub kv_rest_url: Option<String>,
    /// Bearer credential for the hosted key-value store
    pub kv_rest_token: Option<String>,
    /// Selected store backend
    pub kv_backend: KvBackend,
    /// Behaviour when the store fails at call time
    pub failure_policy: StoreFailurePolicy,
    /// Capacity of the in-process store
    pub memory_max_entries: usize,
    /// Interval in seconds between sweeps of the in-process store
    pub cleanup_interval: u64,
    /// TTL in seconds for cached HTTP responses
    pub default_cache_ttl: u64,
    /// Requests allowed per window for each API endpoint
    pub api_rate_limit: u64,
    /// Window for API rate limiting, e.g. "1 m"
    pub api_rate_window: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `RATE_LIMIT_ENABLED` - Enable rate limiting (default: true)
    /// - `KV_REST_URL` / `KV_REST_TOKEN` - Hosted store endpoint and credential
    /// - `KV_BACKEND` - `rest`, `memory` or `none` (default: `rest` when the
    ///   endpoint and credential are both set, otherwise `none`)
    /// - `STORE_FAILURE_POLICY` - `open` or `closed` (default: `closed`)
    /// - `MEMORY_MAX_ENTRIES` - In-process store capacity (default: 10000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 1)
    /// - `DEFAULT_CACHE_TTL` - Cached response TTL in seconds (default: 60)
    /// - `API_RATE_LIMIT` / `API_RATE_WINDOW` - Per-endpoint limit (default: 60 per "1 m")
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let kv_rest_url = non_empty_var("KV_REST_URL");
        let kv_rest_token = non_empty_var("KV_REST_TOKEN");
        let kv_backend = env::var("KV_BACKEND")
            .ok()
            .and_then(|v| KvBackend::parse(&v))
            .unwrap_or(if kv_rest_url.is_some() && kv_rest_token.is_some() {
                KvBackend::Rest
            } else {
                KvBackend::None
            });

        Self {
            server_port: parsed_var("SERVER_PORT").unwrap_or(defaults.server_port),
            rate_limit_enabled: env::var("RATE_LIMIT_ENABLED")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.rate_limit_enabled),
            kv_rest_url,
            kv_rest_token,
            kv_backend,
            failure_policy: env::var("STORE_FAILURE_POLICY")
                .ok()
                .and_then(|v| StoreFailurePolicy::parse(&v))
                .unwrap_or(defaults.failure_policy),
            memory_max_entries: parsed_var("MEMORY_MAX_ENTRIES")
                .unwrap_or(defaults.memory_max_entries),
            cleanup_interval: parsed_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            default_cache_ttl: parsed_var("DEFAULT_CACHE_TTL")
                .unwrap_or(defaults.default_cache_ttl),
            api_rate_limit: parsed_var("API_RATE_LIMIT").unwrap_or(defaults.api_rate_limit),
            api_rate_window: non_empty_var("API_RATE_WINDOW").unwrap_or(defaults.api_rate_window),
        }
    }

    /// Rejects values that would make every API request fail.
    pub fn validate(&self) -> Result<()> {
        if self.default_cache_ttl == 0 {
            return Err(AppError::Config(
                "DEFAULT_CACHE_TTL must be positive".to_string(),
            ));
        }
        if self.api_rate_limit == 0 {
            return Err(AppError::Config("API_RATE_LIMIT must be positive".to_string()));
        }
        parse_window(&self.api_rate_window)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            rate_limit_enabled: true,
            kv_rest_url: None,
            kv_rest_token: None,
            kv_backend: KvBackend::None,
            failure_policy: StoreFailurePolicy::FailClosed,
            memory_max_entries: 10_000,
            cleanup_interval: 1,
            default_cache_ttl: 60,
            api_rate_limit: 60,
            api_rate_window: "1 m".to_string(),
        }
    }
}

// == Env Helpers ==
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert!(config.rate_limit_enabled);
        assert_eq!(config.kv_backend, KvBackend::None);
        assert_eq!(config.failure_policy, StoreFailurePolicy::FailClosed);
        assert_eq!(config.api_rate_window, "1 m");
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "SERVER_PORT",
            "RATE_LIMIT_ENABLED",
            "KV_REST_URL",
            "KV_REST_TOKEN",
            "KV_BACKEND",
            "STORE_FAILURE_POLICY",
            "DEFAULT_CACHE_TTL",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert!(config.rate_limit_enabled);
        assert_eq!(config.kv_backend, KvBackend::None);
        assert!(config.kv_rest_url.is_none());
        assert_eq!(config.default_cache_ttl, 60);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_cache_ttl() {
        let config = Config {
            default_cache_ttl: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_rate_limit() {
        let config = Config {
            api_rate_limit: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_window() {
        let config = Config {
            api_rate_window: "forever".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_parse_backend_and_policy() {
        assert_eq!(KvBackend::parse("Memory"), Some(KvBackend::Memory));
        assert_eq!(KvBackend::parse("redis"), None);
        assert_eq!(
            StoreFailurePolicy::parse("open"),
            Some(StoreFailurePolicy::FailOpen)
        );
    }
}
