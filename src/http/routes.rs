use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Incident intake
        .route("/incidents", post(handlers::create_incident))
        // Session control and queries
        .route(
            "/incidents/:incident_id/cancel",
            post(handlers::cancel_session),
        )
        .route(
            "/incidents/:incident_id/session",
            get(handlers::get_session),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
