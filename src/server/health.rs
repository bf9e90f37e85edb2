//! Health check endpoint.
//!
//! Returns 200 OK if the server is running. Used for liveness probes.

use axum::http::StatusCode;

/// Health check handler.
///
/// Always returns 200 OK with body "OK".
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
