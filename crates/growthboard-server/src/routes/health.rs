use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// `GET /health` - liveness check.
///
/// Does not touch either backend; a degraded source shows up as zeros on the
/// dashboard, not as an unhealthy process.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
