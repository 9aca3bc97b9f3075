//! Network-call cache
//!
//! Memoizes idempotent outbound HTTP calls keyed by a canonical form of the
//! request, storing only successful responses.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CacheService;
use crate::error::{CacheError, Result};

/// Key prefix shared by every cached HTTP response.
pub const HTTP_KEY_PREFIX: &str = "http:";

// == Request Descriptor ==
/// Everything that determines the response of an idempotent call.
///
/// Headers are kept in a `BTreeMap` and JSON bodies use key-sorted maps, so
/// two descriptors built in different orders serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

impl RequestDescriptor {
    /// Creates a descriptor with no headers and no body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Shorthand for a `GET` descriptor.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Adds a header; names are case-insensitive and stored lower-cased.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the JSON body; object key order does not affect the cache key.
    pub fn json_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Normalizes method and header-name casing.
    pub fn canonical(&self) -> Self {
        Self {
            method: self.method.to_ascii_uppercase(),
            url: self.url.clone(),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            body: self.body.as_ref().map(sort_json),
        }
    }

    /// Cache key for this call: the prefix plus its canonical JSON form.
    pub fn cache_key(&self) -> Result<String> {
        let canonical = serde_json::to_string(&self.canonical())
            .map_err(|e| CacheError::Encode(e.to_string()))?;
        Ok(format!("{}{}", HTTP_KEY_PREFIX, canonical))
    }
}

/// Rebuilds objects with keys in sorted order, independent of whether
/// serde_json preserves insertion order.
fn sort_json(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_json(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_json).collect()),
        other => other.clone(),
    }
}

// == Response ==
/// A fully buffered upstream response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decodes the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| CacheError::Decode(e.to_string()))
    }
}

// == Transport ==
/// Performs the real network call.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes `request`. Transport-level failures map to [`CacheError::Upstream`].
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse>;
}

/// [`HttpTransport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| CacheError::InvalidRequest(format!("bad method: {}", e)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CacheError::Upstream(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| CacheError::Upstream(e.to_string()))?
            .to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// == Cached Client ==
/// Wraps a transport so identical calls are answered from the cache.
///
/// Concurrent misses on the same descriptor each reach the transport; there
/// is no single-flight coordination.
pub struct CachedHttpClient<T> {
    cache: CacheService,
    transport: T,
    ttl: Option<Duration>,
}

impl<T: HttpTransport> CachedHttpClient<T> {
    // == Constructor ==
    /// Wraps `transport`, storing responses in `cache`.
    pub fn new(cache: CacheService, transport: T) -> Self {
        Self {
            cache,
            transport,
            ttl: None,
        }
    }

    /// Overrides the cache default TTL for responses stored by this client.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// The wrapped transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // == Send ==
    /// Sends `request`, consulting the cache first.
    ///
    /// Non-2xx responses are returned as-is but never stored. Transport
    /// errors propagate unchanged. If this future is dropped while the call
    /// is in flight, nothing is written.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<HttpResponse> {
        let key = request.cache_key()?;

        if let Some(cached) = self.cache.get::<HttpResponse>(&key).await {
            debug!("HTTP cache hit: {} {}", request.method, request.url);
            return Ok(cached);
        }

        let response = self.transport.execute(&request.canonical()).await?;

        if response.is_success() {
            self.cache.set(&key, &response, self.ttl).await?;
        } else {
            debug!(
                "HTTP status {} for {} {} not cached",
                response.status, request.method, request.url
            );
        }

        Ok(response)
    }
}
