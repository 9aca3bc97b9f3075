//! API Module
//!
//! HTTP handlers and routing for the cache admin surface.
//!
//! # Endpoints
//! - `PUT /keys` - Store a JSON value
//! - `DELETE /keys?pattern=...` - Pattern invalidation
//! - `GET /keys/:key` - Retrieve a value by key
//! - `DELETE /keys/:key` - Delete a key
//! - `POST /flush` - Remove every entry
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
