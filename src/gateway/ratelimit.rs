//! Sliding-window rate limiting.
//!
//! Each identifier gets one counter per fixed window at
//! `rl:{prefix}:{identifier}:{bucket}`. A request is admitted while the
//! current counter plus the still-overlapping share of the previous counter
//! stays under the limit, which approximates a true trailing window with two
//! keys per identifier.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::Gateway;
use crate::error::{AppError, Result};
use crate::store::{KvStore, StoreMode};

/// Extra lifetime given to a bucket beyond the two windows it is read in.
const BUCKET_GRACE: Duration = Duration::from_secs(1);

// == Window Parsing ==
/// Parses a window such as `"10 s"`, `"1m"` or `"500 ms"`.
///
/// Units: `ms`, `s`, `m`, `h`, `d`. The amount must be positive.
pub fn parse_window(window: &str) -> Result<Duration> {
    let trimmed = window.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (amount, unit) = trimmed.split_at(split);

    let invalid = || AppError::Config(format!("invalid rate limit window {:?}", window));
    let amount: u64 = amount.parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }

    let millis_per_unit = match unit.trim() {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        _ => return Err(invalid()),
    };

    amount
        .checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(invalid)
}

// == Client Identifier ==
/// Derives the rate-limit identifier of a request from proxy headers.
///
/// Prefers the first `x-forwarded-for` entry, then `x-real-ip`, then the
/// literal `unknown`.
pub fn client_identifier(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }

    header("x-real-ip")
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

// == Outcome ==
/// Limit metadata surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub limit: u64,
    pub remaining: u64,
    /// Unix time in milliseconds at which the current window ends
    pub reset: u64,
}

/// Result of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitOutcome {
    /// Rate limiting is disabled or no store is configured
    Bypass { limit: u64 },
    /// The request is admitted
    Allowed(RateLimitInfo),
    /// The request must be rejected
    Denied(RateLimitInfo),
}

impl RateLimitOutcome {
    /// Whether the request may proceed.
    pub fn ok(&self) -> bool {
        !matches!(self, Self::Denied(_))
    }

    pub fn info(&self) -> RateLimitInfo {
        match *self {
            Self::Bypass { limit } => RateLimitInfo {
                limit,
                remaining: limit,
                reset: 0,
            },
            Self::Allowed(info) | Self::Denied(info) => info,
        }
    }

    /// Writes the `x-ratelimit-*` response headers.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        let info = self.info();
        headers.insert("x-ratelimit-limit", HeaderValue::from(info.limit));
        headers.insert("x-ratelimit-remaining", HeaderValue::from(info.remaining));
        headers.insert("x-ratelimit-reset", HeaderValue::from(info.reset));
    }
}

impl IntoResponse for RateLimitOutcome {
    /// Renders a 429 response; only meaningful for a denied outcome.
    fn into_response(self) -> Response {
        let info = self.info();
        let body = Json(json!({
            "error": "Too many requests",
            "limit": info.limit,
            "remaining": info.remaining,
            "reset": info.reset,
        }));

        let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
        self.apply_headers(response.headers_mut());
        response
    }
}

// == Sliding Window Limiter ==
/// Sliding-window limiter for one `(prefix, limit, window)` combination.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    prefix: String,
    limit: u64,
    window: Duration,
}

impl SlidingWindowLimiter {
    /// Creates a limiter whose store keys start with `rl:{prefix}`.
    pub fn new(prefix: &str, limit: u64, window: Duration) -> Result<Self> {
        if limit == 0 {
            return Err(AppError::Config("rate limit must be positive".to_string()));
        }
        if window.as_millis() == 0 {
            return Err(AppError::Config(
                "rate limit window must be at least 1 ms".to_string(),
            ));
        }
        Ok(Self {
            prefix: format!("rl:{}", prefix),
            limit,
            window,
        })
    }

    fn bucket_key(&self, identifier: &str, bucket: u64) -> String {
        format!("{}:{}:{}", self.prefix, identifier, bucket)
    }

    /// Evaluates one request from `identifier` at `now_ms`.
    pub async fn limit(
        &self,
        store: &dyn KvStore,
        identifier: &str,
        now_ms: u64,
    ) -> Result<RateLimitOutcome> {
        let window_ms = self.window.as_millis() as u64;
        let bucket = now_ms / window_ms;
        let current_key = self.bucket_key(identifier, bucket);
        let previous_key = self.bucket_key(identifier, bucket.saturating_sub(1));

        let current = read_count(store, &current_key).await?;
        let previous = if bucket == 0 {
            0
        } else {
            read_count(store, &previous_key).await?
        };

        let elapsed = (now_ms % window_ms) as f64 / window_ms as f64;
        let weighted_previous = ((1.0 - elapsed) * previous as f64).floor() as u64;
        let reset = (bucket + 1) * window_ms;

        if weighted_previous + current >= self.limit {
            debug!(identifier, limit = self.limit, "rate limit exceeded");
            return Ok(RateLimitOutcome::Denied(RateLimitInfo {
                limit: self.limit,
                remaining: 0,
                reset,
            }));
        }

        // Every increment re-arms the expiry, so a counter left without one
        // by an earlier failed call still expires with its bucket.
        let count = store.incr(&current_key).await?;
        store
            .pexpire(&current_key, self.window * 2 + BUCKET_GRACE)
            .await?;

        // A concurrent request may have taken the last slot between the
        // read and the increment.
        let used = count.max(0) as u64 + weighted_previous;
        let info = RateLimitInfo {
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
            reset,
        };
        if used > self.limit {
            Ok(RateLimitOutcome::Denied(info))
        } else {
            Ok(RateLimitOutcome::Allowed(info))
        }
    }
}

async fn read_count(store: &dyn KvStore, key: &str) -> Result<u64> {
    match store.get(key).await? {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Store(format!("rate limit counter {} is not an integer", key))),
        None => Ok(0),
    }
}

// == Options ==
/// Parameters of a rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitOptions<'a> {
    /// Key prefix naming the limited resource
    pub prefix: &'a str,
    /// Requests allowed per window
    pub limit: u64,
    /// Window length, e.g. `"1 m"`
    pub window: &'a str,
    /// Overrides the identifier derived from request headers
    pub identifier: Option<&'a str>,
}

impl<'a> RateLimitOptions<'a> {
    pub fn new(prefix: &'a str, limit: u64, window: &'a str) -> Self {
        Self {
            prefix,
            limit,
            window,
            identifier: None,
        }
    }

    pub fn identifier(mut self, identifier: &'a str) -> Self {
        self.identifier = Some(identifier);
        self
    }
}

impl Gateway {
    // == Check Rate Limit ==
    /// Admits or rejects a request under the `(prefix, limit, window)` limit.
    ///
    /// Returns `Bypass` when rate limiting is disabled or no store is
    /// configured.
    pub async fn check_rate_limit(
        &self,
        headers: &HeaderMap,
        options: RateLimitOptions<'_>,
    ) -> Result<RateLimitOutcome> {
        let bypass = RateLimitOutcome::Bypass {
            limit: options.limit,
        };
        if !self.rate_limit_enabled {
            return Ok(bypass);
        }
        let StoreMode::Connected(store) = &self.store else {
            return Ok(bypass);
        };

        let limiter = self.limiter(&options).await?;
        let identifier = match options.identifier {
            Some(identifier) => identifier.to_string(),
            None => client_identifier(headers),
        };

        match limiter
            .limit(store.as_ref(), &identifier, self.now_ms())
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.tolerate("rate limit", err)?;
                Ok(bypass)
            }
        }
    }

    /// Returns the limiter for these options, building it on first use.
    async fn limiter(&self, options: &RateLimitOptions<'_>) -> Result<Arc<SlidingWindowLimiter>> {
        let registry_key = (
            options.prefix.to_string(),
            options.limit,
            options.window.to_string(),
        );

        if let Some(limiter) = self.limiters.read().await.get(&registry_key) {
            return Ok(limiter.clone());
        }

        let limiter = Arc::new(SlidingWindowLimiter::new(
            options.prefix,
            options.limit,
            parse_window(options.window)?,
        )?);
        let mut limiters = self.limiters.write().await;
        Ok(limiters.entry(registry_key).or_insert(limiter).clone())
    }

    /// Number of distinct limiters built so far.
    pub async fn limiter_count(&self) -> usize {
        self.limiters.read().await.len()
    }
}
