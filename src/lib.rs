//! Posyandu - clinical metric service for community health posts
//!
//! Classifies child growth, adult vitals and pregnancy dating, and serves
//! the results through a versioned response cache and a sliding-window
//! rate limiter backed by a key-value store.

pub mod api;
pub mod clinical;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, Result};
pub use gateway::{CacheStatus, Gateway, RateLimitOptions, RateLimitOutcome};
pub use store::{KvStore, MemoryStore, RestStore, StoreMode};
pub use tasks::spawn_cleanup_task;
