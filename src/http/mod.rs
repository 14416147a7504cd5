//! HTTP intake for incident webhooks
//!
//! This module provides the REST surface in front of the orchestrator:
//! - POST /incidents - Submit an incident event
//! - POST /incidents/:id/cancel - Cancel a bot session
//! - GET /incidents/:id/session - Query bot session state
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
