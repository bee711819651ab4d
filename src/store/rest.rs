//! Hosted Store Client
//!
//! Talks to a hosted Redis-compatible store through its REST interface. Each
//! command is POSTed as a JSON array (`["SET", "k", "v", "PX", "60000"]`) with a
//! bearer token; the reply is `{"result": ...}` or `{"error": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::store::KvStore;

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

// == Rest Store ==
/// Client for the hosted key-value store.
///
/// Requests use the HTTP client's own timeout policy.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl RestStore {
    /// Creates a client for the store at `url` authenticated with `token`.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url, token)
    }

    pub fn with_client(
        client: reqwest::Client,
        url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Sends one command and returns its `result` value.
    async fn command(&self, args: &[&str]) -> Result<Value> {
        debug!(command = args.first().copied().unwrap_or_default(), "store command");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await?;

        let status = response.status();
        let reply: CommandReply = response.json().await.map_err(|e| {
            AppError::Store(format!("unreadable reply (HTTP {}): {}", status, e))
        })?;

        match reply.error {
            Some(message) => Err(AppError::Store(message)),
            None if !status.is_success() => Err(AppError::Store(format!("HTTP {}", status))),
            None => Ok(reply.result),
        }
    }
}

fn as_integer(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| AppError::Store(format!("expected integer reply, got {}", n))),
        Value::String(s) => s
            .parse()
            .map_err(|_| AppError::Store(format!("expected integer reply, got {:?}", s))),
        other => Err(AppError::Store(format!("expected integer reply, got {}", other))),
    }
}

#[async_trait]
impl KvStore for RestStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.command(&["GET", key]).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        match ttl {
            Some(ttl) => {
                let millis = ttl.as_millis().max(1).to_string();
                self.command(&["SET", key, value, "PX", &millis]).await?;
            }
            None => {
                self.command(&["SET", key, value]).await?;
            }
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let removed = as_integer(&self.command(&["DEL", key]).await?)?;
        Ok(removed > 0)
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        as_integer(&self.command(&["INCR", key]).await?)
    }

    async fn pexpire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let millis = ttl.as_millis().to_string();
        let applied = as_integer(&self.command(&["PEXPIRE", key, &millis]).await?)?;
        Ok(applied == 1)
    }
}
