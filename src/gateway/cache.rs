//! Versioned read-through cache for JSON responses.
//!
//! Entries live at `cache:{namespace}:v{version}:{key}`. Each namespace has an
//! integer counter at `cachever:{namespace}`; bumping it orphans every entry
//! written under the previous version until the store expires them.

use std::future::Future;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderValue};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::Gateway;
use crate::error::{AppError, Result};
use crate::store::{KvStore, StoreMode};

// == Cache Status ==
/// How a cached value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the store
    Hit,
    /// Computed and written to the store
    Miss,
    /// Computed without touching the store
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }

    /// Writes the `x-cache` response header.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert("x-cache", HeaderValue::from_static(self.as_str()));
    }
}

/// A value together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub status: CacheStatus,
}

impl<T> Cached<T> {
    fn new(value: T, status: CacheStatus) -> Self {
        Self { value, status }
    }
}

/// Store key of a cached entry.
pub fn cache_key(namespace: &str, version: i64, key: &str) -> String {
    format!("cache:{}:v{}:{}", namespace, version, key)
}

/// Store key of a namespace's version counter.
pub fn version_key(namespace: &str) -> String {
    format!("cachever:{}", namespace)
}

enum Lookup<T> {
    Hit(T),
    Miss(String),
}

impl Gateway {
    // == Cached JSON ==
    /// Returns the cached value for `(namespace, key)`, computing and storing
    /// it with `producer` on a miss.
    ///
    /// Without a store, `producer` runs directly and the status is `Bypass`.
    /// A payload that no longer deserializes into `T` is deleted and
    /// recomputed. Errors from `producer` propagate and nothing is cached.
    /// Concurrent misses on the same key may both run `producer`; the last
    /// write wins.
    pub async fn cached_json<T, F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        ttl_seconds: u64,
        producer: F,
    ) -> Result<Cached<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if namespace.is_empty() || key.is_empty() {
            return Err(AppError::InvalidRequest(
                "cache namespace and key must not be empty".to_string(),
            ));
        }
        if ttl_seconds == 0 {
            return Err(AppError::InvalidRequest(
                "cache TTL must be positive".to_string(),
            ));
        }

        let store = match &self.store {
            StoreMode::Connected(store) => store.as_ref(),
            StoreMode::Disabled => {
                return Ok(Cached::new(producer().await?, CacheStatus::Bypass));
            }
        };

        let entry_key = match lookup::<T>(store, namespace, key).await {
            Ok(Lookup::Hit(value)) => {
                debug!(namespace, key, "cache hit");
                return Ok(Cached::new(value, CacheStatus::Hit));
            }
            Ok(Lookup::Miss(entry_key)) => entry_key,
            Err(err) => {
                self.tolerate("cache read", err)?;
                return Ok(Cached::new(producer().await?, CacheStatus::Bypass));
            }
        };

        debug!(namespace, key, "cache miss");
        let value = producer().await?;
        let payload = serde_json::to_string(&value)?;

        match store
            .set(&entry_key, &payload, Some(Duration::from_secs(ttl_seconds)))
            .await
        {
            Ok(()) => Ok(Cached::new(value, CacheStatus::Miss)),
            Err(err) => {
                self.tolerate("cache write", err)?;
                Ok(Cached::new(value, CacheStatus::Bypass))
            }
        }
    }

    // == Bump Cache Version ==
    /// Invalidates every cached entry of `namespace` by incrementing its
    /// version counter.
    ///
    /// Returns the new version, or None when no store is in use.
    pub async fn bump_cache_version(&self, namespace: &str) -> Result<Option<i64>> {
        let StoreMode::Connected(store) = &self.store else {
            return Ok(None);
        };

        match store.incr(&version_key(namespace)).await {
            Ok(version) => {
                debug!(namespace, version, "cache version bumped");
                Ok(Some(version))
            }
            Err(err) => {
                self.tolerate("cache version bump", err)?;
                Ok(None)
            }
        }
    }
}

/// Reads the namespace version, creating it as 1 when absent.
///
/// Creation goes through `incr` so a concurrent bump is never overwritten.
async fn current_version(store: &dyn KvStore, namespace: &str) -> Result<i64> {
    let key = version_key(namespace);
    match store.get(&key).await? {
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::Store(format!("version counter {} is not an integer", key))
        }),
        None => store.incr(&key).await,
    }
}

async fn lookup<T: DeserializeOwned>(
    store: &dyn KvStore,
    namespace: &str,
    key: &str,
) -> Result<Lookup<T>> {
    let version = current_version(store, namespace).await?;
    let entry_key = cache_key(namespace, version, key);

    if let Some(raw) = store.get(&entry_key).await? {
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => return Ok(Lookup::Hit(value)),
            Err(err) => {
                warn!(key = %entry_key, error = %err, "dropping unreadable cache entry");
                store.del(&entry_key).await?;
            }
        }
    }

    Ok(Lookup::Miss(entry_key))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde::Deserialize;

    use super::*;
    use crate::config::StoreFailurePolicy;
    use crate::gateway::testing::FlakyStore;
    use crate::store::MemoryStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Summary {
        visits: u32,
        village: String,
    }

    fn summary() -> Summary {
        Summary {
            visits: 12,
            village: "Sukamaju".to_string(),
        }
    }

    fn memory_gateway() -> (Gateway, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(100));
        (Gateway::new(StoreMode::connected(store.clone())), store)
    }

    #[test]
    fn test_key_formats() {
        assert_eq!(cache_key("reports", 3, "month=5"), "cache:reports:v3:month=5");
        assert_eq!(version_key("reports"), "cachever:reports");
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (gateway, _) = memory_gateway();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let produce = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(summary())
        };

        let first = gateway.cached_json("reports", "all", 60, produce).await.unwrap();
        let second = gateway.cached_json("reports", "all", 60, produce).await.unwrap();

        assert_eq!(first.status, CacheStatus::Miss);
        assert_eq!(second.status, CacheStatus::Hit);
        assert_eq!(first.value, second.value);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_read_initializes_version() {
        let (gateway, store) = memory_gateway();

        gateway
            .cached_json("reports", "all", 60, || async { Ok(summary()) })
            .await
            .unwrap();

        assert_eq!(store.get("cachever:reports").await.unwrap().as_deref(), Some("1"));
        assert!(store.get("cache:reports:v1:all").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_bump_invalidates_namespace_only() {
        let (gateway, _) = memory_gateway();
        let produce = || async { Ok(summary()) };

        gateway.cached_json("reports", "all", 60, produce).await.unwrap();
        gateway.cached_json("patients", "all", 60, produce).await.unwrap();

        assert_eq!(gateway.bump_cache_version("reports").await.unwrap(), Some(2));

        let reports = gateway.cached_json("reports", "all", 60, produce).await.unwrap();
        let patients = gateway.cached_json("patients", "all", 60, produce).await.unwrap();
        assert_eq!(reports.status, CacheStatus::Miss);
        assert_eq!(patients.status, CacheStatus::Hit);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_recomputed() {
        let (gateway, store) = memory_gateway();
        store.set("cachever:reports", "1", None).await.unwrap();
        store
            .set("cache:reports:v1:all", "{not json", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        let result = gateway
            .cached_json("reports", "all", 60, || async { Ok(summary()) })
            .await
            .unwrap();

        assert_eq!(result.status, CacheStatus::Miss);
        assert_eq!(result.value, summary());
        let stored = store.get("cache:reports:v1:all").await.unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Summary>(&stored).unwrap(), summary());
    }

    #[tokio::test]
    async fn test_producer_error_propagates_and_is_not_cached() {
        let (gateway, store) = memory_gateway();

        let result: Result<Cached<Summary>> = gateway
            .cached_json("reports", "all", 60, || async {
                Err(AppError::NotFound("village".to_string()))
            })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(store.get("cache:reports:v1:all").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disabled_store_bypasses() {
        let gateway = Gateway::new(StoreMode::Disabled);

        let result = gateway
            .cached_json("reports", "all", 60, || async { Ok(summary()) })
            .await
            .unwrap();

        assert_eq!(result.status, CacheStatus::Bypass);
        assert_eq!(gateway.bump_cache_version("reports").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_empty_key_and_zero_ttl() {
        let (gateway, _) = memory_gateway();

        let empty = gateway
            .cached_json("reports", "", 60, || async { Ok(summary()) })
            .await;
        let zero = gateway
            .cached_json("reports", "all", 0, || async { Ok(summary()) })
            .await;

        assert!(matches!(empty, Err(AppError::InvalidRequest(_))));
        assert!(matches!(zero, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unreachable_store_fail_closed_propagates() {
        let store = Arc::new(FlakyStore::new());
        store.set_down(true);
        let gateway = Gateway::new(StoreMode::connected(store));

        let result = gateway
            .cached_json("reports", "all", 60, || async { Ok(summary()) })
            .await;
        assert!(matches!(result, Err(AppError::Store(_))));
        assert!(matches!(
            gateway.bump_cache_version("reports").await,
            Err(AppError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_store_fail_open_bypasses() {
        let store = Arc::new(FlakyStore::new());
        store.set_down(true);
        let gateway = Gateway::new(StoreMode::connected(store.clone()))
            .with_failure_policy(StoreFailurePolicy::FailOpen);

        let result = gateway
            .cached_json("reports", "all", 60, || async { Ok(summary()) })
            .await
            .unwrap();
        assert_eq!(result.status, CacheStatus::Bypass);
        assert_eq!(gateway.bump_cache_version("reports").await.unwrap(), None);

        store.set_down(false);
        let result = gateway
            .cached_json("reports", "all", 60, || async { Ok(summary()) })
            .await
            .unwrap();
        assert_eq!(result.status, CacheStatus::Miss);
    }

    #[test]
    fn test_status_header() {
        let mut headers = HeaderMap::new();
        CacheStatus::Hit.apply_headers(&mut headers);
        assert_eq!(headers.get("x-cache").unwrap(), "HIT");
    }
}
