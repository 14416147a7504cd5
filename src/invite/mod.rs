//! Calendar invite construction and dispatch
//!
//! This module builds the iCalendar payload for a qualifying incident and
//! hands the composed invite to a notification transport:
//! - `CalendarInvite` renders one VEVENT per RFC 5545
//! - `InviteDispatcher` composes subject, body, and attachment
//! - `InviteTransport` is the seam between composition and delivery;
//!   `SmtpInviteTransport` is the production implementation

mod dispatcher;
mod ics;
mod smtp;

pub use dispatcher::{DispatchOutcome, InviteDispatcher, InviteTransport, OutboundInvite};
pub use ics::CalendarInvite;
pub use smtp::SmtpInviteTransport;
