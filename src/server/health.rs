//! Liveness endpoint.

use axum::http::StatusCode;

/// Health check handler.
///
/// Returns 200 OK with the text "OK" while the process is serving requests.
/// It does not check Notion reachability or dispatcher load.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
