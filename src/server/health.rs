//! Health check endpoint for liveness probes.
//!
//! Returns 200 OK if the server is running. Intended for load balancers and
//! orchestration systems.

use axum::http::StatusCode;

/// Health check handler.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
