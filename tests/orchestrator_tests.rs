// End-to-end orchestration tests against mock drivers and a recording
// transport: trigger filtering, branch isolation, and the Sev-1 scenario.

mod common;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use common::{MockFactory, RecordingTransport};
use incident_meetings::invite::{InviteTransport, OutboundInvite};
use incident_meetings::{
    AckStatus, BotState, Config, IncidentEvent, InviteDispatcher, Orchestrator, SessionRegistry,
};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn test_config(responders: Vec<&str>) -> Config {
    let mut cfg = Config::default();
    cfg.invites.responders = responders.into_iter().map(String::from).collect();
    cfg.meeting.launch_timeout_secs = 5;
    cfg
}

fn event(incident_id: &str, severity: u8, reporter: Option<&str>) -> IncidentEvent {
    IncidentEvent {
        incident_id: incident_id.to_string(),
        severity,
        summary: "DB cluster down".to_string(),
        reporter_address: reporter.map(String::from),
    }
}

struct Harness {
    registry: Arc<SessionRegistry>,
    factory: Arc<MockFactory>,
    transport: Arc<RecordingTransport>,
    sent_rx: tokio::sync::mpsc::UnboundedReceiver<()>,
    orchestrator: Orchestrator,
}

fn harness(cfg: Config) -> Harness {
    let registry = Arc::new(SessionRegistry::new());
    let factory = MockFactory::well_behaved();
    let (transport, sent_rx) = RecordingTransport::new();
    let dispatcher = Arc::new(InviteDispatcher::new(
        Some(transport.clone() as Arc<dyn InviteTransport>),
        "Incident Bot",
        "bot@example.com",
        30,
    ));
    let orchestrator = Orchestrator::new(
        &cfg,
        Arc::clone(&registry),
        factory.clone(),
        dispatcher,
    );
    Harness {
        registry,
        factory,
        transport,
        sent_rx,
        orchestrator,
    }
}

#[tokio::test]
async fn non_qualifying_severity_has_no_side_effects() {
    let mut h = harness(test_config(vec!["b@x.com"]));

    let ack = h.orchestrator.handle_incident(event("INC1", 2, None)).await;
    assert_eq!(ack.status, AckStatus::Ignored);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.registry.is_empty().await);
    assert_eq!(h.factory.creates.load(Ordering::SeqCst), 0);
    assert!(h.transport.sent.lock().unwrap().is_empty());
    assert!(h.sent_rx.try_recv().is_err());
}

#[tokio::test]
async fn qualifying_incident_launches_bot_and_sends_invites() {
    let mut h = harness(test_config(vec!["b@x.com"]));

    let ack = h
        .orchestrator
        .handle_incident(event("INC1001", 1, Some("a@x.com")))
        .await;
    assert_eq!(ack.status, AckStatus::Accepted);

    let handle = h
        .registry
        .lookup("INC1001")
        .await
        .expect("bot session should be registered");
    let suffix = handle
        .room_id
        .strip_prefix("INC1001-")
        .expect("room id keeps the incident id as prefix");
    assert_eq!(suffix.len(), 8);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));

    timeout(WAIT, handle.wait_for(|s| s == BotState::Holding))
        .await
        .expect("bot should reach holding");
    assert_eq!(h.factory.creates.load(Ordering::SeqCst), 1);

    timeout(WAIT, h.sent_rx.recv())
        .await
        .expect("invite should be dispatched");
    let sent = h.transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 1, "exactly one dispatch attempt");
    let invite = &sent[0];
    assert!(invite.subject.contains("INC1001"));
    let recipients: HashSet<&str> = invite.recipients.iter().map(String::as_str).collect();
    assert_eq!(recipients, HashSet::from(["b@x.com", "a@x.com"]));
    assert!(invite.body.contains(&handle.room_id));
    assert!(invite.body.contains("config.startWithAudioMuted=true"));
    assert!(invite.calendar.contains("ATTENDEE"));
}

#[tokio::test]
async fn duplicate_incident_keeps_one_session_but_still_invites() {
    let mut h = harness(test_config(vec!["b@x.com"]));

    let first = h.orchestrator.handle_incident(event("INC2", 1, None)).await;
    let second = h.orchestrator.handle_incident(event("INC2", 1, None)).await;
    assert_eq!(first.status, AckStatus::Accepted);
    assert_eq!(second.status, AckStatus::Accepted);

    timeout(WAIT, h.sent_rx.recv()).await.expect("first invite");
    timeout(WAIT, h.sent_rx.recv()).await.expect("second invite");

    assert_eq!(h.registry.len().await, 1);
    assert_eq!(h.factory.creates.load(Ordering::SeqCst), 1);
    assert_eq!(h.transport.sent.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_recipient_set_skips_dispatch_but_still_launches_bot() {
    let mut h = harness(test_config(vec![]));

    let ack = h.orchestrator.handle_incident(event("INC3", 1, None)).await;
    assert_eq!(ack.status, AckStatus::Accepted);

    let handle = h.registry.lookup("INC3").await.expect("session registered");
    timeout(WAIT, handle.wait_for(|s| s == BotState::Holding))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.transport.sent.lock().unwrap().is_empty());
    assert!(h.sent_rx.try_recv().is_err());
}

#[tokio::test]
async fn reporter_address_is_not_duplicated_in_recipients() {
    let mut h = harness(test_config(vec!["a@x.com"]));

    h.orchestrator
        .handle_incident(event("INC4", 1, Some("a@x.com")))
        .await;

    timeout(WAIT, h.sent_rx.recv()).await.unwrap();
    let sent = h.transport.sent.lock().unwrap();
    assert_eq!(sent[0].recipients, vec!["a@x.com"]);
}

#[tokio::test]
async fn missing_transport_credentials_do_not_affect_the_session() {
    let registry = Arc::new(SessionRegistry::new());
    let factory = MockFactory::well_behaved();
    let dispatcher = Arc::new(InviteDispatcher::new(None, "Incident Bot", "", 30));
    let orchestrator = Orchestrator::new(
        &test_config(vec!["b@x.com"]),
        Arc::clone(&registry),
        factory.clone(),
        dispatcher,
    );

    let ack = orchestrator.handle_incident(event("INC5", 1, None)).await;
    assert_eq!(ack.status, AckStatus::Accepted);

    let handle = registry.lookup("INC5").await.expect("session registered");
    let state = timeout(WAIT, handle.wait_for(|s| s == BotState::Holding))
        .await
        .expect("session launch proceeds without a transport");
    assert_eq!(state, BotState::Holding);
}

/// Transport that always fails; the bot session must not notice.
struct FailingTransport;

#[async_trait]
impl InviteTransport for FailingTransport {
    async fn send(&self, _invite: &OutboundInvite) -> anyhow::Result<()> {
        bail!("transport down")
    }
}

#[tokio::test]
async fn invite_failure_is_isolated_from_the_session_branch() {
    let registry = Arc::new(SessionRegistry::new());
    let factory = MockFactory::well_behaved();
    let dispatcher = Arc::new(InviteDispatcher::new(
        Some(Arc::new(FailingTransport) as Arc<dyn InviteTransport>),
        "Incident Bot",
        "bot@example.com",
        30,
    ));
    let orchestrator = Orchestrator::new(
        &test_config(vec!["b@x.com"]),
        Arc::clone(&registry),
        factory.clone(),
        dispatcher,
    );

    let ack = orchestrator.handle_incident(event("INC6", 1, None)).await;
    assert_eq!(ack.status, AckStatus::Accepted);

    let handle = registry.lookup("INC6").await.expect("session registered");
    let state = timeout(WAIT, handle.wait_for(|s| s == BotState::Holding))
        .await
        .expect("dispatch failure must not cancel the session");
    assert_eq!(state, BotState::Holding);

    handle.cancel();
    assert_eq!(
        timeout(WAIT, handle.terminal_state()).await.unwrap(),
        BotState::Closed
    );
}
