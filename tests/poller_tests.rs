mod common;

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use ratewatch::api::ws_types::{ScopedMessage, StopReason, WsMessage};
use ratewatch::backend::{CurrentSession, RateBackend};
use ratewatch::models::ScanStatus;
use ratewatch::services::{start_polling, WatchRegistry};

use common::{MockBackend, EXPIRED_TOKEN, OTHER_USER_TOKEN, TEST_TOKEN};

const PERIOD: Duration = Duration::from_secs(3);

fn drain(rx: &mut broadcast::Receiver<ScopedMessage>) -> Vec<WsMessage> {
    let mut out = Vec::new();
    while let Ok(scoped) = rx.try_recv() {
        out.push(scoped.message);
    }
    out
}

fn stop_reasons(events: &[WsMessage]) -> Vec<(&'static str, StopReason)> {
    let mut reasons: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            WsMessage::PollStopped(s) => Some((s.resource, s.reason)),
            _ => None,
        })
        .collect();
    reasons.sort_by_key(|(resource, _)| *resource);
    reasons
}

fn session_statuses(events: &[WsMessage]) -> Vec<ScanStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            WsMessage::SessionUpdate(u) => Some(u.session.status),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_polling_stops_after_terminal_status() {
    let backend = MockBackend::new();
    backend.script_status(&[
        Some(ScanStatus::Running),
        Some(ScanStatus::Running),
        Some(ScanStatus::Completed),
    ]);
    let (tx, mut rx) = broadcast::channel(64);

    let handle = start_polling(
        backend.clone() as Arc<dyn RateBackend>,
        CurrentSession::new(TEST_TOKEN),
        Uuid::new_v4(),
        PERIOD,
        tx,
    );

    sleep(Duration::from_secs(30)).await;

    // Ticks at 0s, 3s and 6s; the third observes `completed`.
    assert_eq!(backend.status_calls(), 3);
    // Logs get exactly one fetch after seeing the terminal status.
    let log_calls = backend.log_calls();
    assert!((3..=4).contains(&log_calls), "log calls = {log_calls}");
    assert!(handle.is_finished());
    assert!(handle.snapshot().is_terminal());

    // The clock keeps running but nothing else is fetched.
    sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.status_calls(), 3);
    assert_eq!(backend.log_calls(), log_calls);

    let events = drain(&mut rx);
    assert_eq!(
        session_statuses(&events),
        vec![ScanStatus::Running, ScanStatus::Running, ScanStatus::Completed]
    );
    assert_eq!(
        stop_reasons(&events),
        vec![("logs", StopReason::Terminal), ("status", StopReason::Terminal)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_fetch_after_teardown() {
    let backend = MockBackend::new();
    backend.script_status(&[Some(ScanStatus::Running)]);
    let (tx, _rx) = broadcast::channel(64);

    let handle = start_polling(
        backend.clone() as Arc<dyn RateBackend>,
        CurrentSession::new(TEST_TOKEN),
        Uuid::new_v4(),
        PERIOD,
        tx,
    );

    sleep(Duration::from_secs(7)).await;
    let status_calls = backend.status_calls();
    let log_calls = backend.log_calls();
    assert!(status_calls >= 2);
    assert!(!handle.is_finished());

    handle.stop();
    sleep(Duration::from_secs(60)).await;

    assert_eq!(backend.status_calls(), status_calls);
    assert_eq!(backend.log_calls(), log_calls);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failures_do_not_stop_polling() {
    let backend = MockBackend::new();
    backend.script_status(&[None, None, Some(ScanStatus::Partial)]);
    let (tx, mut rx) = broadcast::channel(64);

    let handle = start_polling(
        backend.clone() as Arc<dyn RateBackend>,
        CurrentSession::new(TEST_TOKEN),
        Uuid::new_v4(),
        PERIOD,
        tx,
    );

    sleep(Duration::from_secs(30)).await;

    assert_eq!(backend.status_calls(), 3);
    assert!(handle.is_finished());

    let events = drain(&mut rx);
    let errors = events
        .iter()
        .filter(|e| matches!(e, WsMessage::PollError(_)))
        .count();
    assert_eq!(errors, 2);
    assert_eq!(session_statuses(&events), vec![ScanStatus::Partial]);
}

#[tokio::test(start_paused = true)]
async fn test_stale_status_is_ignored() {
    let backend = MockBackend::new();
    backend.script_status(&[
        Some(ScanStatus::Running),
        Some(ScanStatus::Pending),
        Some(ScanStatus::Completed),
    ]);
    let (tx, mut rx) = broadcast::channel(64);

    let _handle = start_polling(
        backend.clone() as Arc<dyn RateBackend>,
        CurrentSession::new(TEST_TOKEN),
        Uuid::new_v4(),
        PERIOD,
        tx,
    );

    sleep(Duration::from_secs(30)).await;

    let events = drain(&mut rx);
    assert_eq!(
        session_statuses(&events),
        vec![ScanStatus::Running, ScanStatus::Completed]
    );
}

#[tokio::test(start_paused = true)]
async fn test_registry_unwatch_stops_polling() {
    let backend = MockBackend::new();
    backend.script_status(&[Some(ScanStatus::Running)]);
    let (tx, _rx) = broadcast::channel(64);
    let registry = WatchRegistry::new(PERIOD);
    let session_id = Uuid::new_v4();

    registry
        .watch(
            backend.clone(),
            CurrentSession::new(TEST_TOKEN),
            session_id,
            tx,
        )
        .await;
    sleep(Duration::from_secs(4)).await;

    let owner = CurrentSession::new(TEST_TOKEN);
    assert_eq!(registry.active_count().await, 1);
    let (snapshot, active) = registry.snapshot(session_id, &owner).await.unwrap();
    assert!(active);
    assert_eq!(snapshot.session.map(|s| s.status), Some(ScanStatus::Running));

    assert!(registry.unwatch(session_id, &owner).await);
    let calls = backend.status_calls();
    sleep(Duration::from_secs(30)).await;

    assert_eq!(backend.status_calls(), calls);
    assert_eq!(registry.active_count().await, 0);
    assert!(!registry.unwatch(session_id, &owner).await);
}

#[tokio::test(start_paused = true)]
async fn test_registry_hides_watchers_from_other_users() {
    let backend = MockBackend::new();
    backend.script_status(&[Some(ScanStatus::Running)]);
    let (tx, _rx) = broadcast::channel(64);
    let registry = WatchRegistry::new(PERIOD);
    let session_id = Uuid::new_v4();
    let owner = CurrentSession::new(TEST_TOKEN);
    let stranger = CurrentSession::new(OTHER_USER_TOKEN);

    registry
        .watch(backend.clone(), owner.clone(), session_id, tx)
        .await;
    sleep(Duration::from_secs(4)).await;

    assert!(registry.snapshot(session_id, &stranger).await.is_none());
    assert!(!registry.unwatch(session_id, &stranger).await);

    let (_, active) = registry.snapshot(session_id, &owner).await.unwrap();
    assert!(active);
}

#[tokio::test(start_paused = true)]
async fn test_expired_token_stops_polling() {
    let backend = MockBackend::new();
    backend.script_status(&[Some(ScanStatus::Running)]);
    let (tx, mut rx) = broadcast::channel(64);

    let handle = start_polling(
        backend.clone() as Arc<dyn RateBackend>,
        CurrentSession::new(EXPIRED_TOKEN),
        Uuid::new_v4(),
        PERIOD,
        tx,
    );

    sleep(Duration::from_secs(3600)).await;

    assert!(handle.is_finished());
    assert_eq!(handle.snapshot().halted, Some(StopReason::Unauthorized));

    let events = drain(&mut rx);
    assert!(!events.iter().any(|e| matches!(e, WsMessage::PollError(_))));
    assert_eq!(
        stop_reasons(&events),
        vec![
            ("logs", StopReason::Unauthorized),
            ("status", StopReason::Unauthorized)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_session_stops_polling() {
    let backend = MockBackend::new();
    backend.script_status(&[Some(ScanStatus::Running)]);
    let (tx, mut rx) = broadcast::channel(64);

    let handle = start_polling(
        backend.clone() as Arc<dyn RateBackend>,
        CurrentSession::new(OTHER_USER_TOKEN),
        Uuid::new_v4(),
        PERIOD,
        tx,
    );

    sleep(Duration::from_secs(3600)).await;

    assert!(handle.is_finished());
    let events = drain(&mut rx);
    assert_eq!(
        stop_reasons(&events),
        vec![("logs", StopReason::NotFound), ("status", StopReason::NotFound)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_events_carry_their_owner() {
    let backend = MockBackend::new();
    backend.script_status(&[Some(ScanStatus::Completed)]);
    let (tx, mut rx) = broadcast::channel(64);

    let _handle = start_polling(
        backend.clone() as Arc<dyn RateBackend>,
        CurrentSession::new(TEST_TOKEN),
        Uuid::new_v4(),
        PERIOD,
        tx,
    );
    sleep(Duration::from_secs(10)).await;

    let owner = CurrentSession::new(TEST_TOKEN);
    let stranger = CurrentSession::new(OTHER_USER_TOKEN);
    let mut seen = 0;
    while let Ok(scoped) = rx.try_recv() {
        assert!(scoped.visible_to(&owner));
        assert!(!scoped.visible_to(&stranger));
        seen += 1;
    }
    assert!(seen > 0);
}
