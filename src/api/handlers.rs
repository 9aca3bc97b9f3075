//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::CacheService;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, InvalidateResponse, PatternQuery, SetRequest,
    SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared cache handle
    pub cache: CacheService,
}

impl AppState {
    pub fn new(cache: CacheService) -> Self {
        Self { cache }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheService::from_config(config))
    }
}

/// Handler for PUT /keys
///
/// Stores a JSON value with optional TTL in seconds.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(Duration::from_secs);
    state.cache.set(&req.key, &req.value, ttl).await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /keys/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get::<serde_json::Value>(&key)
        .await
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /keys/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.delete(&key).await;
    Json(DeleteResponse::new(key))
}

/// Handler for DELETE /keys?pattern=...
pub async fn delete_pattern_handler(
    State(state): State<AppState>,
    Query(query): Query<PatternQuery>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = query.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.delete_by_pattern(&query.pattern).await;
    Ok(Json(InvalidateResponse::pattern(query.pattern, removed)))
}

/// Handler for POST /flush
pub async fn flush_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = state.cache.flush().await;
    Json(InvalidateResponse::flush(removed))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
