//! HTTP endpoint handlers.

use axum::Json;
use kotatsu_shared::protocol::HELLO_BODY;

/// Plain-text liveness probe used by clients before opening the socket.
pub async fn hello() -> &'static str {
    HELLO_BODY
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
