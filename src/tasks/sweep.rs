//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries so keys
//! that are never read again do not accumulate.

use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheService, CacheStore};

/// Removes all currently expired entries, at most `chunk` per write-lock
/// acquisition, yielding to other tasks between chunks.
///
/// Expired keys are collected in a single pass under the read lock, so a
/// sweep stays linear in the number of entries however many chunks it takes.
/// Returns the total number of entries removed.
pub async fn sweep_expired(store: &RwLock<CacheStore>, chunk: usize) -> usize {
    let expired = store.read().await.expired_keys();
    let mut total = 0;

    for keys in expired.chunks(chunk.max(1)) {
        total += store.write().await.remove_expired(keys);
        tokio::task::yield_now().await;
    }

    total
}

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The sweep only reclaims memory; reads already treat expired entries as
/// absent whether or not the sweep has run.
///
/// # Arguments
/// * `cache` - The cache to sweep; the task keeps its store alive
/// * `interval` - Time between sweeps
/// * `chunk` - Max entries removed per lock acquisition
///
/// # Returns
/// A JoinHandle for the spawned task, which can be aborted on shutdown.
///
/// # Example
/// ```ignore
/// let cache = CacheService::new(Duration::from_secs(3600));
/// let sweeper = spawn_sweep_task(&cache, Duration::from_secs(720), 512);
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweep_task(cache: &CacheService, interval: Duration, chunk: usize) -> JoinHandle<()> {
    let store = cache.store();

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {:?} (chunk {})",
            interval, chunk
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = sweep_expired(&store, chunk).await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
