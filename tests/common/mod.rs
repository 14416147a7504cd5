// Shared test doubles: scripted meeting drivers and a recording transport.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use incident_meetings::invite::{InviteTransport, OutboundInvite};
use incident_meetings::{MeetingDriver, MeetingDriverFactory};
use tokio::sync::mpsc;

/// Counts every lifecycle call so tests can assert exactly-once semantics.
#[derive(Default)]
pub struct DriverCalls {
    pub joins: AtomicUsize,
    pub closes: AtomicUsize,
    pub display_names: AtomicUsize,
    pub mutes: AtomicUsize,
    pub keepalives: AtomicUsize,
}

/// Behavior knobs for a scripted driver.
#[derive(Clone, Default)]
pub struct DriverScript {
    pub fail_join: bool,
    pub hang_join: bool,
    pub fail_preferences: bool,
    pub fail_keepalive: bool,
}

pub struct MockDriver {
    calls: Arc<DriverCalls>,
    script: DriverScript,
}

#[async_trait]
impl MeetingDriver for MockDriver {
    async fn join(&mut self, _join_url: &str) -> Result<()> {
        self.calls.joins.fetch_add(1, Ordering::SeqCst);
        if self.script.hang_join {
            std::future::pending::<()>().await;
        }
        if self.script.fail_join {
            bail!("scripted join failure");
        }
        Ok(())
    }

    async fn set_display_name(&mut self, _name: &str) -> Result<()> {
        self.calls.display_names.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_preferences {
            bail!("scripted preference failure");
        }
        Ok(())
    }

    async fn set_mute(&mut self, _audio: bool, _video: bool) -> Result<()> {
        self.calls.mutes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn keepalive(&mut self) -> Result<()> {
        self.calls.keepalives.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_keepalive {
            bail!("scripted keepalive failure");
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub struct MockFactory {
    pub calls: Arc<DriverCalls>,
    pub creates: AtomicUsize,
    script: DriverScript,
}

impl MockFactory {
    pub fn new(script: DriverScript) -> Arc<Self> {
        Arc::new(Self {
            calls: Arc::default(),
            creates: AtomicUsize::new(0),
            script,
        })
    }

    pub fn well_behaved() -> Arc<Self> {
        Self::new(DriverScript::default())
    }
}

impl MeetingDriverFactory for MockFactory {
    fn create(&self) -> Result<Box<dyn MeetingDriver>> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDriver {
            calls: Arc::clone(&self.calls),
            script: self.script.clone(),
        }))
    }
}

/// Records every outbound invite and signals a channel on each send.
pub struct RecordingTransport {
    pub sent: Mutex<Vec<OutboundInvite>>,
    tx: mpsc::UnboundedSender<()>,
}

impl RecordingTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                tx,
            }),
            rx,
        )
    }
}

#[async_trait]
impl InviteTransport for RecordingTransport {
    async fn send(&self, invite: &OutboundInvite) -> Result<()> {
        self.sent.lock().unwrap().push(invite.clone());
        let _ = self.tx.send(());
        Ok(())
    }
}
