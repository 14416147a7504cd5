//! Automated meeting participant
//!
//! This module provides the bot that joins a meeting room and holds it open:
//! - The `MeetingDriver` capability interface over one automated participant
//! - A headless-Chrome driver speaking a minimal slice of CDP
//! - The `BotSession` supervisor driving the acquire/join/hold/release
//!   lifecycle as a state machine

mod cdp;
mod chrome;
mod driver;
mod headless;
mod supervisor;

pub use driver::{MeetingDriver, MeetingDriverFactory};
pub use headless::{HeadlessChromeFactory, HeadlessMeetingDriver};
pub use supervisor::{BotHandle, BotSession, BotState, SupervisorOptions};
