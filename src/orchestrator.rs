use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::bot::{BotSession, MeetingDriverFactory, SupervisorOptions};
use crate::config::Config;
use crate::incident::{Acknowledgment, IncidentEvent};
use crate::invite::InviteDispatcher;
use crate::registry::{RegistryError, SessionRegistry};
use crate::room::RoomBuilder;

/// Coordinating entry point for qualifying incidents.
///
/// Holds an injected registry, driver factory, and dispatcher; constructed
/// per process (or per test), never a global.
pub struct Orchestrator {
    trigger_severity: u8,
    responders: Vec<String>,
    rooms: RoomBuilder,
    supervisor_opts: SupervisorOptions,
    registry: Arc<SessionRegistry>,
    drivers: Arc<dyn MeetingDriverFactory>,
    invites: Arc<InviteDispatcher>,
}

impl Orchestrator {
    pub fn new(
        cfg: &Config,
        registry: Arc<SessionRegistry>,
        drivers: Arc<dyn MeetingDriverFactory>,
        invites: Arc<InviteDispatcher>,
    ) -> Self {
        Self {
            trigger_severity: cfg.service.trigger_severity,
            responders: cfg.invites.responders.clone(),
            rooms: RoomBuilder::new(&cfg.meeting.base_url),
            supervisor_opts: SupervisorOptions {
                display_name: cfg.meeting.bot_display_name.clone(),
                launch_timeout: Duration::from_secs(cfg.meeting.launch_timeout_secs),
                keepalive_interval: Duration::from_secs(cfg.meeting.keepalive_interval_secs),
            },
            registry,
            drivers,
            invites,
        }
    }

    /// Accept one incident event.
    ///
    /// Returns before the bot reaches `Holding` and before any invite leaves
    /// the building; both branches continue detached and fail independently.
    pub async fn handle_incident(&self, event: IncidentEvent) -> Acknowledgment {
        if event.severity != self.trigger_severity {
            info!(
                incident_id = %event.incident_id,
                severity = event.severity,
                "ignoring incident, severity does not trigger a meeting"
            );
            return Acknowledgment::ignored(event.severity);
        }
        info!(
            incident_id = %event.incident_id,
            summary = %event.summary,
            "handling qualifying incident"
        );

        let room = self.rooms.build(&event.incident_id);
        let (handle, run) = BotSession::new(
            &event.incident_id,
            Arc::clone(&self.drivers),
            room.clone(),
            self.supervisor_opts.clone(),
        );
        match self.registry.register(&event.incident_id, handle).await {
            Ok(()) => {
                info!(
                    incident_id = %event.incident_id,
                    room_id = %room.room_id,
                    "bot session registered, launching"
                );
                tokio::spawn(run);
            }
            // The unstarted run future acquires nothing; dropping it here
            // keeps the existing session untouched.
            Err(RegistryError::DuplicateSession(_)) => {
                warn!(
                    incident_id = %event.incident_id,
                    "bot session already active, skipping launch"
                );
            }
            Err(e) => {
                warn!(incident_id = %event.incident_id, error = %e, "bot session not registered");
            }
        }

        let recipients = self.recipients(&event);
        if recipients.is_empty() {
            warn!(
                incident_id = %event.incident_id,
                "no invite recipients configured, skipping dispatch"
            );
        } else {
            let dispatcher = Arc::clone(&self.invites);
            let incident_id = event.incident_id.clone();
            let summary = event.summary.clone();
            let join_url = room.join_url.clone();
            tokio::spawn(async move {
                if let Err(e) = dispatcher
                    .dispatch(&incident_id, &summary, recipients, &join_url)
                    .await
                {
                    error!(incident_id = %incident_id, error = %e, "invite dispatch failed");
                }
            });
        }

        Acknowledgment::accepted(&event.incident_id)
    }

    fn recipients(&self, event: &IncidentEvent) -> Vec<String> {
        let mut recipients = self.responders.clone();
        if let Some(reporter) = &event.reporter_address {
            if !reporter.is_empty() && !recipients.contains(reporter) {
                recipients.push(reporter.clone());
            }
        }
        recipients
    }
}
