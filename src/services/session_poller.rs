use std::sync::Arc;

use metrics::counter;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use uuid::Uuid;

use crate::api::ws_types::{
    LogsUpdate, PollErrorData, PollStoppedData, ScopedMessage, SessionUpdate, StopReason,
    WsMessage,
};
use crate::backend::{BackendError, CurrentSession, RateBackend};
use crate::intelligence::scan_progress;
use crate::models::{QueryLog, ScanSession, ScanStatus};

/// Default spacing between poll ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Latest state seen by a poller.
#[derive(Debug, Clone, Default)]
pub struct PollSnapshot {
    pub session: Option<ScanSession>,
    pub logs: Vec<QueryLog>,
    /// Set when a fetch failed in a way retrying cannot fix.
    pub halted: Option<StopReason>,
}

impl PollSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.status.is_terminal())
    }

    fn status(&self) -> Option<ScanStatus> {
        self.session.as_ref().map(|s| s.status)
    }
}

/// Errors that end polling instead of being retried on the next tick.
fn fatal_reason(err: &BackendError) -> Option<StopReason> {
    match err {
        BackendError::Unauthorized => Some(StopReason::Unauthorized),
        BackendError::NotFound(_) => Some(StopReason::NotFound),
        _ => None,
    }
}

/// Broadcasts poll events tagged with the session they were fetched for.
#[derive(Clone)]
struct Publisher {
    owner: CurrentSession,
    tx: broadcast::Sender<ScopedMessage>,
}

impl Publisher {
    fn send(&self, message: WsMessage) {
        let _ = self.tx.send(ScopedMessage {
            owner: self.owner.clone(),
            message,
        });
    }

    fn stopped(
        &self,
        session_id: Uuid,
        resource: &'static str,
        reason: StopReason,
        status: Option<ScanStatus>,
    ) {
        self.send(WsMessage::PollStopped(PollStoppedData {
            session_id,
            resource,
            reason,
            status,
        }));
    }
}

/// Guards against status regressions from out-of-order or stale responses.
#[derive(Debug, Default)]
pub struct SessionTracker {
    status: Option<ScanStatus>,
}

impl SessionTracker {
    /// Record `next` if it moves forward. Returns false when it was refused.
    pub fn apply(&mut self, next: ScanStatus) -> bool {
        match self.status {
            Some(current) if !current.can_advance_to(next) => false,
            _ => {
                self.status = Some(next);
                true
            }
        }
    }

    pub fn status(&self) -> Option<ScanStatus> {
        self.status
    }
}

/// Running poll pair for one scan session. Dropping the handle aborts both
/// polls, so a closed view never leaves a timer behind.
#[derive(Debug)]
pub struct PollHandle {
    session_id: Uuid,
    snapshot: watch::Receiver<PollSnapshot>,
    status_task: JoinHandle<()>,
    logs_task: JoinHandle<()>,
}

impl PollHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn snapshot(&self) -> PollSnapshot {
        self.snapshot.borrow().clone()
    }

    /// True once both polls have stopped on their own.
    pub fn is_finished(&self) -> bool {
        self.status_task.is_finished() && self.logs_task.is_finished()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.status_task.abort();
        self.logs_task.abort();
    }
}

/// Start polling a scan session's status and logs on a fixed interval.
///
/// The status poll stops after the fetch that observes a terminal status.
/// The log poll stops after one more fetch once it sees that terminal status,
/// so the final logs are always captured. Transient fetch failures are
/// logged and published and retried on the next tick. An unauthorized or
/// not-found response halts both polls.
pub fn start_polling(
    backend: Arc<dyn RateBackend>,
    session: CurrentSession,
    session_id: Uuid,
    period: Duration,
    events: broadcast::Sender<ScopedMessage>,
) -> PollHandle {
    let (snapshot_tx, snapshot_rx) = watch::channel(PollSnapshot::default());
    let snapshot_tx = Arc::new(snapshot_tx);
    let events = Publisher {
        owner: session.clone(),
        tx: events,
    };

    tracing::info!(
        session_id = %session_id,
        interval_secs = period.as_secs_f64(),
        "Session poller started"
    );

    let status_task = tokio::spawn(run_status_poll(
        Arc::clone(&backend),
        session.clone(),
        session_id,
        period,
        Arc::clone(&snapshot_tx),
        events.clone(),
    ));

    let logs_task = tokio::spawn(run_logs_poll(
        backend,
        session,
        session_id,
        period,
        snapshot_tx,
        events,
    ));

    PollHandle {
        session_id,
        snapshot: snapshot_rx,
        status_task,
        logs_task,
    }
}

async fn run_status_poll(
    backend: Arc<dyn RateBackend>,
    session: CurrentSession,
    session_id: Uuid,
    period: Duration,
    snapshot: Arc<watch::Sender<PollSnapshot>>,
    events: Publisher,
) {
    let mut ticker = interval(period);
    let mut tracker = SessionTracker::default();

    loop {
        ticker.tick().await;

        let halted = snapshot.borrow().halted;
        if let Some(reason) = halted {
            events.stopped(session_id, "status", reason, tracker.status());
            break;
        }
        counter!("session_poll_ticks_total", "resource" => "status").increment(1);

        let fetched = match backend.get_session(&session, session_id).await {
            Ok(s) => s,
            Err(e) => {
                counter!("session_poll_failures_total", "resource" => "status").increment(1);
                if let Some(reason) = fatal_reason(&e) {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Status poll: halting"
                    );
                    snapshot.send_modify(|snap| snap.halted = Some(reason));
                    events.stopped(session_id, "status", reason, tracker.status());
                    break;
                }
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Status poll: failed to fetch session"
                );
                events.send(WsMessage::PollError(PollErrorData {
                    session_id,
                    resource: "status",
                    error: e.to_string(),
                }));
                continue;
            }
        };

        if !tracker.apply(fetched.status) {
            tracing::warn!(
                session_id = %session_id,
                seen = ?tracker.status(),
                fetched = %fetched.status,
                "Status poll: ignoring status regression"
            );
            continue;
        }

        let status = fetched.status;
        let mut progress = None;
        snapshot.send_modify(|snap| {
            progress = Some(scan_progress(&fetched, &snap.logs));
            snap.session = Some(fetched.clone());
        });

        if let Some(progress) = progress {
            tracing::debug!(
                session_id = %session_id,
                status = %status,
                percent = progress.percent,
                "Status poll: session updated"
            );
            events.send(WsMessage::SessionUpdate(SessionUpdate {
                session: fetched,
                progress,
            }));
        }

        if status.is_terminal() {
            tracing::info!(session_id = %session_id, status = %status, "Status poll: session finished");
            events.stopped(session_id, "status", StopReason::Terminal, Some(status));
            break;
        }
    }
}

async fn run_logs_poll(
    backend: Arc<dyn RateBackend>,
    session: CurrentSession,
    session_id: Uuid,
    period: Duration,
    snapshot: Arc<watch::Sender<PollSnapshot>>,
    events: Publisher,
) {
    let mut ticker = interval(period);

    loop {
        ticker.tick().await;

        // Read before fetching: a terminal status seen here makes this the final fetch.
        let (final_fetch, halted, status) = {
            let snap = snapshot.borrow();
            (snap.is_terminal(), snap.halted, snap.status())
        };
        if let Some(reason) = halted {
            events.stopped(session_id, "logs", reason, status);
            break;
        }
        counter!("session_poll_ticks_total", "resource" => "logs").increment(1);

        match backend.session_logs(&session, session_id).await {
            Ok(logs) => {
                tracing::debug!(session_id = %session_id, count = logs.len(), "Logs poll: fetched logs");
                snapshot.send_modify(|snap| snap.logs = logs.clone());
                events.send(WsMessage::LogsUpdate(LogsUpdate { session_id, logs }));
            }
            Err(e) => {
                counter!("session_poll_failures_total", "resource" => "logs").increment(1);
                if let Some(reason) = fatal_reason(&e) {
                    tracing::warn!(session_id = %session_id, error = %e, "Logs poll: halting");
                    snapshot.send_modify(|snap| snap.halted = Some(reason));
                    events.stopped(session_id, "logs", reason, status);
                    break;
                }
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Logs poll: failed to fetch logs"
                );
                events.send(WsMessage::PollError(PollErrorData {
                    session_id,
                    resource: "logs",
                    error: e.to_string(),
                }));
            }
        }

        if final_fetch {
            tracing::info!(session_id = %session_id, "Logs poll: final fetch done");
            events.stopped(session_id, "logs", StopReason::Terminal, status);
            break;
        }
    }
}
