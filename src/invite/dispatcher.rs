use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::ics::CalendarInvite;

/// A fully composed invite ready for a transport.
#[derive(Debug, Clone)]
pub struct OutboundInvite {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
    /// `text/calendar` attachment content, delivered as `invite.ics`.
    pub calendar: String,
}

/// Delivery seam; implementations transmit one composed invite to all of
/// its recipients in a single call.
#[async_trait::async_trait]
pub trait InviteTransport: Send + Sync {
    async fn send(&self, invite: &OutboundInvite) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// Transport not configured or nobody to invite; not an error.
    Skipped,
}

/// Builds the calendar payload for an incident and hands it to the
/// transport. Failure here never touches the bot session branch.
pub struct InviteDispatcher {
    transport: Option<Arc<dyn InviteTransport>>,
    organizer_name: String,
    organizer_address: String,
    window: Duration,
}

impl InviteDispatcher {
    pub fn new(
        transport: Option<Arc<dyn InviteTransport>>,
        organizer_name: impl Into<String>,
        organizer_address: impl Into<String>,
        window_minutes: i64,
    ) -> Self {
        Self {
            transport,
            organizer_name: organizer_name.into(),
            organizer_address: organizer_address.into(),
            window: Duration::minutes(window_minutes),
        }
    }

    /// Compose and transmit one invite for a qualifying incident.
    ///
    /// The event window starts now (UTC). Missing transport credentials and
    /// an empty recipient set both degrade to a logged no-op.
    pub async fn dispatch(
        &self,
        incident_id: &str,
        summary: &str,
        recipients: Vec<String>,
        join_url: &str,
    ) -> Result<DispatchOutcome> {
        let Some(transport) = &self.transport else {
            warn!(incident_id, "invite transport not configured, skipping invites");
            return Ok(DispatchOutcome::Skipped);
        };
        if recipients.is_empty() {
            warn!(incident_id, "no invite recipients, skipping invites");
            return Ok(DispatchOutcome::Skipped);
        }

        let start = Utc::now();
        let subject = format!("[SEV-1] {incident_id}: {summary}");
        let invite = CalendarInvite {
            subject: subject.clone(),
            start,
            end: start + self.window,
            organizer_name: self.organizer_name.clone(),
            organizer_address: self.organizer_address.clone(),
            attendees: recipients.clone(),
            location: join_url.to_string(),
            uid: Uuid::new_v4().to_string(),
        };
        let body = format!(
            "A Sev-1 incident was opened: {incident_id}\n\n\
             Join the bridge: {join_url}\n\n\
             The bot is holding the room open; click the link to join."
        );

        let outbound = OutboundInvite {
            subject,
            body,
            recipients,
            calendar: invite.to_ics(),
        };
        transport
            .send(&outbound)
            .await
            .context("transmitting invites")?;

        info!(
            incident_id,
            recipients = outbound.recipients.len(),
            "invites dispatched"
        );
        Ok(DispatchOutcome::Sent)
    }
}
