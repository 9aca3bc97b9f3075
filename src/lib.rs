//! Page Cache - a process-local generic cache service
//!
//! Stores any serializable value under a string key with expiry, compresses
//! payloads, supports substring-based invalidation, and wraps HTTP calls,
//! repositories and stale-while-revalidate reads so they become cacheable.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;
pub mod wrappers;

pub use api::AppState;
pub use cache::CacheService;
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
