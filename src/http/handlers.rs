use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Serialize;
use tracing::info;

use super::state::AppState;
use crate::bot::BotState;
use crate::incident::{AckStatus, IncidentEvent};
use crate::registry::RegistryError;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub incident_id: String,
    pub room_id: String,
    pub state: BotState,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub incident_id: String,
    pub state: BotState,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /incidents
/// Submit an incident event; only qualifying severities trigger orchestration
pub async fn create_incident(
    State(state): State<AppState>,
    Json(event): Json<IncidentEvent>,
) -> impl IntoResponse {
    if event.incident_id.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "incident_id must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    info!(incident_id = %event.incident_id, "incident event received");

    let ack = state.orchestrator.handle_incident(event).await;
    let status = match ack.status {
        AckStatus::Accepted => StatusCode::ACCEPTED,
        AckStatus::Ignored => StatusCode::OK,
    };
    (status, Json(ack)).into_response()
}

/// POST /incidents/:incident_id/cancel
/// Tear down the bot session for an incident
pub async fn cancel_session(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
) -> impl IntoResponse {
    match state.registry.cancel(&incident_id).await {
        Ok(final_state) => (
            StatusCode::OK,
            Json(CancelResponse {
                incident_id,
                state: final_state,
            }),
        )
            .into_response(),
        Err(RegistryError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no bot session for incident {incident_id}"),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /incidents/:incident_id/session
/// Snapshot of the bot session state for an incident
pub async fn get_session(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
) -> impl IntoResponse {
    match state.registry.lookup(&incident_id).await {
        Some(handle) => (
            StatusCode::OK,
            Json(SessionResponse {
                incident_id,
                room_id: handle.room_id.clone(),
                state: handle.state(),
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no bot session for incident {incident_id}"),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
