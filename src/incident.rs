use serde::{Deserialize, Serialize};

/// Intake payload for one operational incident.
///
/// Consumed once per orchestration call; never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct IncidentEvent {
    pub incident_id: String,
    pub severity: u8,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub reporter_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    Accepted,
    Ignored,
}

/// What the triggering caller gets back: acceptance of the event, never the
/// outcome of the background branches.
#[derive(Debug, Clone, Serialize)]
pub struct Acknowledgment {
    pub status: AckStatus,
    pub message: String,
}

impl Acknowledgment {
    pub fn accepted(incident_id: &str) -> Self {
        Self {
            status: AckStatus::Accepted,
            message: format!("incident {incident_id} accepted, meeting orchestration started"),
        }
    }

    pub fn ignored(severity: u8) -> Self {
        Self {
            status: AckStatus::Ignored,
            message: format!("severity {severity} does not trigger a meeting"),
        }
    }
}
