//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

use crate::config::MAX_TTL_SECS;

// == Cache Entry ==
/// A single stored payload with its expiry.
///
/// Owned by [`crate::cache::CacheStore`] and never handed out to callers;
/// only copies of the payload leave the store.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Compressed, serialized value
    pub payload: Vec<u8>,
    /// Insertion instant
    pub created_at: Instant,
    /// Instant at which the entry stops being served
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// TTLs beyond [`MAX_TTL_SECS`] are clamped, so any `Duration` is accepted.
    pub fn new(payload: Vec<u8>, ttl: Duration) -> Self {
        let now = Instant::now();

        Self {
            payload,
            created_at: now,
            expires_at: expiry_after(now, ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiry instant,
    /// so a live entry always satisfies `expires_at > now`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// `now + ttl` with the TTL clamped, halving it further on platforms whose
/// `Instant` cannot reach that far.
fn expiry_after(now: Instant, ttl: Duration) -> Instant {
    let mut ttl = ttl.min(Duration::from_secs(MAX_TTL_SECS));
    loop {
        if let Some(expires_at) = now.checked_add(ttl) {
            return expires_at;
        }
        ttl /= 2;
    }
}
