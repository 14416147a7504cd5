// Tests for the session registry: uniqueness invariant, atomic registration,
// cancellation semantics.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{DriverScript, MockFactory};
use incident_meetings::{
    BotSession, BotState, RegistryError, RoomBuilder, SessionRegistry, SupervisorOptions,
};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn fast_opts() -> SupervisorOptions {
    SupervisorOptions {
        display_name: "IncidentBot".to_string(),
        launch_timeout: Duration::from_millis(200),
        keepalive_interval: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn duplicate_registration_is_rejected_while_active() {
    let registry = SessionRegistry::new();
    let factory = MockFactory::well_behaved();
    let rooms = RoomBuilder::new("https://meet.jit.si");

    let (first, run) = BotSession::new("INC7", factory.clone(), rooms.build("INC7"), fast_opts());
    registry.register("INC7", first.clone()).await.unwrap();
    tokio::spawn(run);

    let (second, run2) = BotSession::new("INC7", factory.clone(), rooms.build("INC7"), fast_opts());
    let err = registry.register("INC7", second).await.unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateSession(_)));
    drop(run2);

    assert_eq!(registry.len().await, 1);
    let state = registry.cancel("INC7").await.unwrap();
    assert_eq!(state, BotState::Closed);
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn registration_succeeds_after_previous_session_failed() {
    let registry = SessionRegistry::new();
    let failing = MockFactory::new(DriverScript {
        fail_join: true,
        ..Default::default()
    });
    let rooms = RoomBuilder::new("https://meet.jit.si");

    let (handle, run) = BotSession::new("INC8", failing.clone(), rooms.build("INC8"), fast_opts());
    registry.register("INC8", handle.clone()).await.unwrap();
    tokio::spawn(run);

    let state = timeout(WAIT, handle.terminal_state()).await.unwrap();
    assert_eq!(state, BotState::Failed);

    // The terminal entry is replaced, not rejected.
    let healthy = MockFactory::well_behaved();
    let (fresh, run2) = BotSession::new("INC8", healthy, rooms.build("INC8"), fast_opts());
    registry.register("INC8", fresh).await.unwrap();
    drop(run2);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn cancel_of_unknown_incident_is_not_found() {
    let registry = SessionRegistry::new();
    let err = registry.cancel("INC404").await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[tokio::test]
async fn lookup_returns_the_registered_session() {
    let registry = SessionRegistry::new();
    let factory = MockFactory::well_behaved();
    let rooms = RoomBuilder::new("https://meet.jit.si");

    let (handle, run) = BotSession::new("INC9", factory, rooms.build("INC9"), fast_opts());
    registry.register("INC9", handle.clone()).await.unwrap();
    drop(run);

    let found = registry.lookup("INC9").await.expect("session registered");
    assert_eq!(found.incident_id, "INC9");
    assert_eq!(found.room_id, handle.room_id);
    assert!(registry.lookup("INC10").await.is_none());
}

#[tokio::test]
async fn concurrent_registration_admits_exactly_one() {
    let registry = Arc::new(SessionRegistry::new());
    let factory = MockFactory::well_behaved();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let registry = Arc::clone(&registry);
        let factory = factory.clone();
        tasks.push(tokio::spawn(async move {
            let room = RoomBuilder::new("https://meet.jit.si").build("INC11");
            let (handle, run) = BotSession::new("INC11", factory, room, fast_opts());
            match registry.register("INC11", handle).await {
                Ok(()) => {
                    tokio::spawn(run);
                    true
                }
                Err(_) => false,
            }
        }));
    }

    let results = futures::future::join_all(tasks).await;
    let admitted = results
        .into_iter()
        .map(|r| r.expect("task should not panic"))
        .filter(|&ok| ok)
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(registry.len().await, 1);
}
