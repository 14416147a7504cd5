use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::bot::{BotHandle, BotState};

#[derive(Debug, Error)]
pub enum RegistryError {
    /// An active (non-terminal) session already exists for this incident.
    #[error("a bot session is already active for incident {0}")]
    DuplicateSession(String),
    #[error("no bot session registered for incident {0}")]
    NotFound(String),
}

/// In-memory store enforcing at most one active bot session per incident.
///
/// The sole shared mutable state of the orchestrator; safe under concurrent
/// access from any number of incident flows.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, BotHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic check-and-insert: rejected while an existing entry is
    /// non-terminal, a terminal leftover is replaced.
    pub async fn register(&self, incident_id: &str, handle: BotHandle) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(incident_id) {
            if !existing.state().is_terminal() {
                return Err(RegistryError::DuplicateSession(incident_id.to_string()));
            }
        }
        sessions.insert(incident_id.to_string(), handle);
        Ok(())
    }

    pub async fn lookup(&self, incident_id: &str) -> Option<BotHandle> {
        self.sessions.read().await.get(incident_id).cloned()
    }

    /// Signal the session to terminate, wait for it to reach a terminal
    /// state, then drop the entry. Duplicate concurrent cancels are safe;
    /// the supervisor releases its resource exactly once either way.
    pub async fn cancel(&self, incident_id: &str) -> Result<BotState, RegistryError> {
        let handle = self
            .lookup(incident_id)
            .await
            .ok_or_else(|| RegistryError::NotFound(incident_id.to_string()))?;

        info!(incident_id, "cancelling bot session");
        handle.cancel();
        let state = handle.terminal_state().await;

        // Only remove the entry we cancelled; a fresh session may have
        // replaced a terminal one in the meantime.
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(incident_id)
            .is_some_and(|current| current.room_id == handle.room_id)
        {
            sessions.remove(incident_id);
        }

        Ok(state)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
