use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// `TraceLayer` logs each request/response via `tracing`; `CorsLayer` lets a
/// separately hosted front end read the dashboard JSON.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/dashboard", get(routes::dashboard::get_dashboard))
        .fallback(|| async { AppError::NotFound("Route not found".to_string()) })
        .method_not_allowed_fallback(|| async { AppError::MethodNotAllowed })
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
