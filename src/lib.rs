pub mod bot;
pub mod config;
pub mod http;
pub mod incident;
pub mod invite;
pub mod orchestrator;
pub mod registry;
pub mod room;

pub use bot::{
    BotHandle, BotSession, BotState, HeadlessChromeFactory, MeetingDriver, MeetingDriverFactory,
    SupervisorOptions,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use incident::{AckStatus, Acknowledgment, IncidentEvent};
pub use invite::{
    CalendarInvite, DispatchOutcome, InviteDispatcher, InviteTransport, OutboundInvite,
    SmtpInviteTransport,
};
pub use orchestrator::Orchestrator;
pub use registry::{RegistryError, SessionRegistry};
pub use room::{MeetingRoom, MuteDefaults, RoomBuilder};
