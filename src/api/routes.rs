//! API Routes
//!
//! Configures the Axum router with the cache admin endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, delete_pattern_handler, flush_handler, get_handler, health_handler,
    set_handler, stats_handler, AppState,
};

/// Creates the admin router.
///
/// # Endpoints
/// - `PUT /keys` - Store a JSON value
/// - `DELETE /keys?pattern=...` - Remove every key containing the pattern
/// - `GET /keys/:key` - Retrieve a value by key
/// - `DELETE /keys/:key` - Delete a key
/// - `POST /flush` - Remove every entry
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/keys", put(set_handler).delete(delete_pattern_handler))
        .route("/keys/:key", get(get_handler).delete(delete_handler))
        .route("/flush", post(flush_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
