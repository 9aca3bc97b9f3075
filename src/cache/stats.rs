//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses and removals.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (absent, expired or corrupt)
    pub misses: u64,
    /// Number of entries removed because their TTL elapsed
    pub expirations: u64,
    /// Number of entries evicted because their payload failed to decode
    pub corrupt_evictions: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Records a cache hit.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Records a cache miss.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Corrupt ==
    /// Reclassifies a store-level hit whose payload failed to decode as a
    /// miss, counting an eviction when the entry was removed.
    pub fn record_corrupt(&mut self, evicted: bool) {
        self.hits = self.hits.saturating_sub(1);
        self.misses += 1;
        if evicted {
            self.corrupt_evictions += 1;
        }
    }

    // == Record Expirations ==
    /// Records entries removed because their TTL elapsed.
    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    // == Set Total Entries ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
