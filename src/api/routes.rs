//! API Routes
//!
//! Configures the Axum router with all service endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    adult_handler, age_handler, bump_handler, child_handler, health_handler, pregnancy_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/clinical/child", get(child_handler))
        .route("/api/clinical/adult", get(adult_handler))
        .route("/api/clinical/pregnancy", get(pregnancy_handler))
        .route("/api/clinical/age", get(age_handler))
        .route("/api/cache/:namespace/bump", post(bump_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
