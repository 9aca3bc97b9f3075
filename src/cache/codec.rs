//! Payload Codec
//!
//! Turns values into compressed byte payloads and back: JSON serialization
//! followed by gzip.

use std::io::Read;

use flate2::bufread::{GzDecoder, GzEncoder};
use flate2::Compression;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CacheError, Result};

/// Serializes `value` and gzip-compresses the result.
///
/// Fails with [`CacheError::Encode`] when the value has no JSON
/// representation (for example a map with non-string keys).
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(value).map_err(|e| CacheError::Encode(e.to_string()))?;

    let mut compressed = Vec::new();
    GzEncoder::new(json.as_slice(), Compression::fast())
        .read_to_end(&mut compressed)
        .map_err(|e| CacheError::Encode(format!("compression failed: {}", e)))?;

    Ok(compressed)
}

/// Decompresses `bytes` and deserializes them into `T`.
///
/// Fails with [`CacheError::Decode`] on invalid gzip data or when the JSON
/// does not match the requested shape.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut json = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut json)
        .map_err(|e| CacheError::Decode(format!("decompression failed: {}", e)))?;

    serde_json::from_slice(&json).map_err(|e| CacheError::Decode(e.to_string()))
}
