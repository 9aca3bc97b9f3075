//! Cache Store Module
//!
//! Key-indexed payload storage with per-entry expiry and bulk invalidation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, CacheStats};

// == Cache Store ==
/// In-memory map from key to compressed payload.
///
/// The store is not synchronized itself; [`crate::cache::CacheService`] keeps it
/// behind an `RwLock` so each method call here is one atomic map operation.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-payload storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
    /// TTL applied when `set` receives `None` or a zero duration
    default_ttl: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL for entries stored without an explicit one
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            default_ttl,
        }
    }

    /// The TTL used when none is given.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Set ==
    /// Inserts or replaces the payload for `key`.
    ///
    /// The previous entry, if any, is replaced as a whole; its TTL is reset.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `payload` - Encoded value bytes
    /// * `ttl` - Optional TTL (uses default_ttl if None or zero, clamped to
    ///   [`MAX_TTL_SECS`](crate::config::MAX_TTL_SECS))
    pub fn set(&mut self, key: String, payload: Vec<u8>, ttl: Option<Duration>) {
        let effective_ttl = match ttl {
            Some(ttl) if !ttl.is_zero() => ttl,
            _ => self.default_ttl,
        };

        self.entries.insert(key, CacheEntry::new(payload, effective_ttl));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns a copy of the payload if present and not expired.
    ///
    /// An expired entry found here is removed on the spot and reported as
    /// absent, whether or not the sweep has reached it yet.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                self.stats.record_hit();
                return Some(entry.payload.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
        }
        self.stats.record_miss();
        None
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Delete By Pattern ==
    /// Removes every entry whose key contains `pattern`.
    ///
    /// Linear in the number of stored entries. Returns the number removed.
    pub fn delete_by_pattern(&mut self, pattern: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.contains(pattern));
        self.stats.set_total_entries(self.entries.len());
        before - self.entries.len()
    }

    // == Flush ==
    /// Removes all entries. Returns the number removed.
    pub fn flush(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.stats.set_total_entries(0);
        count
    }

    // == Evict Corrupt ==
    /// Bookkeeping for a payload that failed to decode after a hit.
    ///
    /// The entry is removed only while it still holds `payload`; a value
    /// written after the failed read is kept. Returns whether it was removed.
    pub(crate) fn evict_corrupt(&mut self, key: &str, payload: &[u8]) -> bool {
        let evicted = match self.entries.get(key) {
            Some(entry) if entry.payload == payload => {
                self.entries.remove(key);
                true
            }
            _ => false,
        };

        self.stats.record_corrupt(evicted);
        self.stats.set_total_entries(self.entries.len());
        evicted
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Expired Keys ==
    /// Keys of every entry expired at this moment, collected in one pass.
    pub fn expired_keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == Remove Expired ==
    /// Removes those of `keys` that are still expired.
    ///
    /// A key re-set since it was collected is live again and stays. Returns
    /// the number removed.
    pub fn remove_expired(&mut self, keys: &[String]) -> usize {
        let now = Instant::now();
        let mut count = 0;

        for key in keys {
            if self.entries.get(key).is_some_and(|e| e.is_expired_at(now)) {
                self.entries.remove(key);
                count += 1;
            }
        }

        self.stats.record_expirations(count);
        self.stats.set_total_entries(self.entries.len());
        count
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(CacheEntry::ttl_remaining)
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
