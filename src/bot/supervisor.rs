use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{interval_at, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::driver::{MeetingDriver, MeetingDriverFactory};
use crate::room::{MeetingRoom, MuteDefaults};

/// Lifecycle of one supervised bot session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BotState {
    Launching,
    Joining,
    Holding,
    Cancelling,
    Closed,
    Failed,
}

impl BotState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BotState::Closed | BotState::Failed)
    }
}

/// Options governing one supervised bot session.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub display_name: String,
    /// Bound on resource acquisition and join navigation.
    pub launch_timeout: Duration,
    /// Liveness probe period while holding the room.
    pub keepalive_interval: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            display_name: "IncidentBot".to_string(),
            launch_timeout: Duration::from_secs(60),
            keepalive_interval: Duration::from_secs(60),
        }
    }
}

/// Cloneable view of a running bot session: observe state transitions,
/// request cancellation.
#[derive(Debug, Clone)]
pub struct BotHandle {
    pub incident_id: String,
    pub room_id: String,
    state: watch::Receiver<BotState>,
    cancel: CancellationToken,
}

impl BotHandle {
    /// Current state snapshot.
    pub fn state(&self) -> BotState {
        *self.state.borrow()
    }

    /// Signal the session to terminate. Idempotent; release still happens
    /// exactly once however many times this is called.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait until the state satisfies `pred` and return the matching state.
    pub async fn wait_for(&self, mut pred: impl FnMut(BotState) -> bool) -> BotState {
        let mut rx = self.state.clone();
        if let Ok(state) = rx.wait_for(|s| pred(*s)).await {
            return *state;
        }
        // The sender only drops without a terminal send if the supervisor
        // task panicked or was never spawned.
        let state = *rx.borrow();
        state
    }

    /// Wait until the session reaches `Closed` or `Failed`.
    pub async fn terminal_state(&self) -> BotState {
        self.wait_for(BotState::is_terminal).await
    }
}

enum HoldEnd {
    Cancelled,
    Died,
}

/// Supervises one automated participant: acquire, join, hold, release.
///
/// The driver is created and released inside the run future, so an unstarted
/// session acquires nothing and a started one releases exactly once on every
/// exit path.
pub struct BotSession {
    incident_id: String,
    factory: Arc<dyn MeetingDriverFactory>,
    room: MeetingRoom,
    opts: SupervisorOptions,
    state: watch::Sender<BotState>,
    cancel: CancellationToken,
}

impl BotSession {
    /// Build a session for `room`. Returns the registry handle and the run
    /// future; the future does nothing until spawned.
    pub fn new(
        incident_id: &str,
        factory: Arc<dyn MeetingDriverFactory>,
        room: MeetingRoom,
        opts: SupervisorOptions,
    ) -> (BotHandle, impl Future<Output = ()> + Send + 'static) {
        let (state_tx, state_rx) = watch::channel(BotState::Launching);
        let cancel = CancellationToken::new();
        let handle = BotHandle {
            incident_id: incident_id.to_string(),
            room_id: room.room_id.clone(),
            state: state_rx,
            cancel: cancel.clone(),
        };
        let session = Self {
            incident_id: incident_id.to_string(),
            factory,
            room,
            opts,
            state: state_tx,
            cancel,
        };
        (handle, session.run())
    }

    async fn run(self) {
        let mut driver = match self.factory.create() {
            Ok(driver) => driver,
            Err(e) => {
                error!(
                    incident_id = %self.incident_id,
                    error = %e,
                    "failed to create meeting driver"
                );
                let _ = self.state.send(BotState::Failed);
                return;
            }
        };
        debug!(
            driver = driver.name(),
            room_id = %self.room.room_id,
            "meeting driver created"
        );

        let established = tokio::select! {
            () = self.cancel.cancelled() => None,
            res = self.establish(&mut *driver) => Some(res),
        };

        let final_state = match established {
            Some(Ok(())) => {
                let _ = self.state.send(BotState::Holding);
                info!(room_id = %self.room.room_id, "bot holding the room open");
                match self.hold(&mut *driver).await {
                    HoldEnd::Cancelled => {
                        let _ = self.state.send(BotState::Cancelling);
                        BotState::Closed
                    }
                    HoldEnd::Died => BotState::Failed,
                }
            }
            Some(Err(e)) => {
                error!(
                    incident_id = %self.incident_id,
                    error = %e,
                    "bot session failed before holding"
                );
                BotState::Failed
            }
            None => {
                info!(incident_id = %self.incident_id, "bot session cancelled before holding");
                let _ = self.state.send(BotState::Cancelling);
                BotState::Closed
            }
        };

        if let Err(e) = driver.close().await {
            warn!(
                incident_id = %self.incident_id,
                error = %e,
                "error releasing meeting session"
            );
        }
        let _ = self.state.send(final_state);
        info!(incident_id = %self.incident_id, state = ?final_state, "bot session finished");
    }

    async fn establish(&self, driver: &mut dyn MeetingDriver) -> Result<()> {
        timeout(self.opts.launch_timeout, driver.join(&self.room.join_url))
            .await
            .map_err(|_| {
                anyhow!(
                    "joining {} timed out after {:?}",
                    self.room.join_url,
                    self.opts.launch_timeout
                )
            })?
            .context("joining meeting room")?;

        let _ = self.state.send(BotState::Joining);
        self.apply_preferences(driver).await;
        Ok(())
    }

    /// Display name and mute are cosmetic; holding the room open wins over
    /// configuring it. One retry, then proceed regardless.
    async fn apply_preferences(&self, driver: &mut dyn MeetingDriver) {
        for attempt in 1..=2u32 {
            match Self::preferences(driver, &self.opts.display_name, self.room.mute).await {
                Ok(()) => return,
                Err(e) => warn!(attempt, error = %e, "applying bot preferences failed"),
            }
        }
        warn!(room_id = %self.room.room_id, "holding room without preferences applied");
    }

    async fn preferences(
        driver: &mut dyn MeetingDriver,
        display_name: &str,
        mute: MuteDefaults,
    ) -> Result<()> {
        driver.set_display_name(display_name).await?;
        driver.set_mute(mute.audio, mute.video).await
    }

    async fn hold(&self, driver: &mut dyn MeetingDriver) -> HoldEnd {
        let period = self.opts.keepalive_interval;
        let mut tick = interval_at(Instant::now() + period, period);
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return HoldEnd::Cancelled,
                _ = tick.tick() => {
                    if let Err(e) = driver.keepalive().await {
                        error!(
                            room_id = %self.room.room_id,
                            error = %e,
                            "automation session died while holding"
                        );
                        return HoldEnd::Died;
                    }
                    debug!(room_id = %self.room.room_id, "bot keepalive");
                }
            }
        }
    }
}
