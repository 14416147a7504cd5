use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use super::dispatcher::{InviteTransport, OutboundInvite};
use crate::config::SmtpConfig;

/// SMTP-backed invite transport.
pub struct SmtpInviteTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpInviteTransport {
    /// Returns `None` when username or password is absent; invite dispatch
    /// then degrades to a logged no-op.
    pub fn from_config(cfg: &SmtpConfig, from_name: &str) -> Result<Option<Self>> {
        let (Some(username), Some(password)) = (&cfg.username, &cfg.password) else {
            return Ok(None);
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .context("building smtp transport")?
            .port(cfg.port)
            .credentials(Credentials::new(username.clone(), password.clone()))
            .build();
        let from = format!("{from_name} <{username}>")
            .parse::<Mailbox>()
            .context("parsing organizer mailbox")?;

        Ok(Some(Self { transport, from }))
    }
}

#[async_trait]
impl InviteTransport for SmtpInviteTransport {
    async fn send(&self, invite: &OutboundInvite) -> Result<()> {
        let calendar_type = ContentType::parse("text/calendar; charset=utf-8; method=REQUEST")
            .context("calendar content type")?;

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(invite.subject.clone());
        for recipient in &invite.recipients {
            let mailbox = recipient
                .parse::<Mailbox>()
                .with_context(|| format!("parsing recipient {recipient}"))?;
            builder = builder.to(mailbox);
        }

        let message = builder
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(invite.body.clone()))
                    .singlepart(
                        Attachment::new("invite.ics".to_string())
                            .body(invite.calendar.clone(), calendar_type),
                    ),
            )
            .context("building invite message")?;

        self.transport
            .send(message)
            .await
            .context("smtp send")?;

        info!(recipients = invite.recipients.len(), "invite email sent");
        Ok(())
    }
}
