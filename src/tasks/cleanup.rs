//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired keys out of the
//! in-process store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a background task that removes expired keys every
/// `cleanup_interval_secs` seconds.
///
/// Expired keys are already invisible to readers; the sweep only reclaims
/// their memory. The returned handle is aborted on shutdown.
pub fn spawn_cleanup_task(store: Arc<MemoryStore>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired().await;
            if removed > 0 {
                info!("TTL cleanup: removed {} expired keys", removed);
            } else {
                debug!("TTL cleanup: no expired keys found");
            }
        }
    })
}
