//! Cache Module
//!
//! Process-local storage of encoded values with TTL expiration, pattern
//! invalidation and the [`CacheService`] façade.

pub mod codec;
mod entry;
mod service;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use entry::CacheEntry;

// Re-export public types
pub use service::CacheService;
pub use stats::CacheStats;
pub use store::CacheStore;
