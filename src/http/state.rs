use std::sync::Arc;

use crate::orchestrator::Orchestrator;
use crate::registry::SessionRegistry;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, registry: Arc<SessionRegistry>) -> Self {
        Self {
            orchestrator,
            registry,
        }
    }
}
