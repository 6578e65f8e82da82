//! API Routes
//!
//! Routing table mapping method and path to the cache handlers.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_key, delete_key, get_all_values, get_value, health_handler, update_key, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// `/cache/` without a key segment reaches the single-key handlers with no
/// key, which they report as a bad request.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", get(get_all_values).post(create_key).put(update_key))
        .route("/cache/", get(get_value).delete(delete_key))
        .route("/cache/:key", get(get_value).delete(delete_key))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
