//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies and queries.

use serde::Deserialize;

/// Request body for PUT /keys
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// Any JSON value
    pub value: serde_json::Value,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}

/// Query string for DELETE /keys
#[derive(Debug, Clone, Deserialize)]
pub struct PatternQuery {
    /// Substring; every key containing it is removed
    pub pattern: String,
}

impl PatternQuery {
    pub fn validate(&self) -> Option<String> {
        // An empty pattern would match every key; /flush exists for that
        if self.pattern.is_empty() {
            return Some("Pattern cannot be empty".to_string());
        }
        None
    }
}
