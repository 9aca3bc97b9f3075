//! Cache Service
//!
//! The public get/set/delete surface composing [`CacheStore`] with the codec.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{codec, CacheStats, CacheStore};
use crate::config::Config;
use crate::error::Result;

// == Cache Service ==
/// Shared handle to the process cache.
///
/// Construct one per process and clone the handle into every component that
/// needs caching; all clones share the same store. Each method takes the
/// store lock for a single operation and releases it before returning, so
/// callers never hold the lock across their own `.await` points.
#[derive(Clone, Debug)]
pub struct CacheService {
    store: Arc<RwLock<CacheStore>>,
}

impl CacheService {
    // == Constructor ==
    /// Creates a service backed by a fresh store.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            store: Arc::new(RwLock::new(CacheStore::new(default_ttl))),
        }
    }

    /// Creates a service from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.default_ttl())
    }

    /// The underlying store, for the sweep task.
    pub(crate) fn store(&self) -> Arc<RwLock<CacheStore>> {
        Arc::clone(&self.store)
    }

    // == Get ==
    /// Returns the value stored under `key`, or `None` on a miss.
    ///
    /// A payload that no longer decodes into `T` is evicted and reported as
    /// a miss, unless `key` was overwritten while decoding.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = self.store.write().await.get(key);

        let Some(payload) = payload else {
            debug!("Cache MISS: {}", key);
            return None;
        };

        match codec::decode(&payload) {
            Ok(value) => {
                debug!("Cache HIT: {}", key);
                Some(value)
            }
            Err(e) => {
                if self.store.write().await.evict_corrupt(key, &payload) {
                    warn!("Evicted undecodable entry {}: {}", key, e);
                } else {
                    debug!("Undecodable read of {} raced a write: {}", key, e);
                }
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl` (default TTL when `None` or zero).
    ///
    /// Encoding happens before the lock is taken; on an encode error the
    /// previous entry for `key` is left untouched and the error is returned.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let payload = codec::encode(value)?;
        let size = payload.len();

        self.store.write().await.set(key.to_string(), payload, ttl);
        debug!("Cache SET: {} ({} bytes)", key, size);
        Ok(())
    }

    // == Delete ==
    /// Removes `key`; no-op if absent.
    pub async fn delete(&self, key: &str) {
        if self.store.write().await.delete(key) {
            debug!("Cache DEL: {}", key);
        }
    }

    // == Delete By Pattern ==
    /// Removes every key containing `pattern`. O(n) in the number of entries.
    pub async fn delete_by_pattern(&self, pattern: &str) -> usize {
        let removed = self.store.write().await.delete_by_pattern(pattern);
        debug!("Cache DEL pattern '{}': {} removed", pattern, removed);
        removed
    }

    // == Flush ==
    /// Removes every entry.
    pub async fn flush(&self) -> usize {
        let removed = self.store.write().await.flush();
        debug!("Cache FLUSH: {} removed", removed);
        removed
    }

    // == Stats ==
    /// Snapshot of the hit/miss counters.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
