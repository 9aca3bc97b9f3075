//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default TTL in seconds for entries stored without an explicit TTL.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Longest TTL an entry can be given; larger values are clamped to it.
pub const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Default maximum number of expired keys removed per sweep lock acquisition.
pub const DEFAULT_SWEEP_CHUNK: usize = 512;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// Max expired entries removed per write-lock acquisition during a sweep
    pub sweep_chunk: usize,
    /// Admin HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 20% of `DEFAULT_TTL`)
    /// - `SWEEP_CHUNK` - Entries removed per lock acquisition (default: 512)
    /// - `SERVER_PORT` - Admin HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let default_ttl = bounded_ttl(env_or("DEFAULT_TTL", DEFAULT_TTL_SECS));

        Self {
            default_ttl,
            sweep_interval: env_or("SWEEP_INTERVAL", derived_sweep_interval(default_ttl)).max(1),
            sweep_chunk: env_or("SWEEP_CHUNK", DEFAULT_SWEEP_CHUNK).max(1),
            server_port: env_or("SERVER_PORT", 3000),
        }
    }

    /// Default TTL as a `Duration`.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Sweep interval as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL_SECS,
            sweep_interval: derived_sweep_interval(DEFAULT_TTL_SECS),
            sweep_chunk: DEFAULT_SWEEP_CHUNK,
            server_port: 3000,
        }
    }
}

/// Clamps a TTL in seconds into `1..=MAX_TTL_SECS`.
pub fn bounded_ttl(secs: u64) -> u64 {
    secs.clamp(1, MAX_TTL_SECS)
}

/// Sweep runs at a fifth of the default TTL, never faster than once a second.
pub fn derived_sweep_interval(default_ttl: u64) -> u64 {
    (default_ttl / 5).max(1)
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
