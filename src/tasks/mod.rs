//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of the cache.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries at the configured interval

mod sweep;

pub use sweep::{spawn_sweep_task, sweep_expired};
