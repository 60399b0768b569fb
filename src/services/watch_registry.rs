use std::collections::HashMap;
use std::sync::Arc;

use metrics::gauge;
use tokio::sync::{broadcast, Mutex};
use tokio::time::Duration;
use uuid::Uuid;

use crate::api::ws_types::ScopedMessage;
use crate::backend::{CurrentSession, RateBackend};
use crate::services::session_poller::{start_polling, PollHandle, PollSnapshot};

/// Who is watching which scan session.
type WatchKey = (Uuid, CurrentSession);

/// Session pollers keyed by scan session and the user watching it.
///
/// Watching starts when a dashboard view opens a session and ends when it
/// closes; replacing or removing an entry drops its handle, which cancels
/// the polls. One user's watcher is invisible to every other user.
#[derive(Debug, Clone)]
pub struct WatchRegistry {
    inner: Arc<Mutex<HashMap<WatchKey, PollHandle>>>,
    period: Duration,
}

impl WatchRegistry {
    pub fn new(period: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            period,
        }
    }

    /// Start (or restart) polling `session_id` on behalf of `session`.
    pub async fn watch(
        &self,
        backend: Arc<dyn RateBackend>,
        session: CurrentSession,
        session_id: Uuid,
        events: broadcast::Sender<ScopedMessage>,
    ) {
        let handle = start_polling(backend, session.clone(), session_id, self.period, events);

        let mut map = self.inner.lock().await;
        map.retain(|_, h| !h.is_finished());
        if map.insert((session_id, session), handle).is_some() {
            tracing::debug!(session_id = %session_id, "Replaced existing session watcher");
        }
        gauge!("active_session_watchers").set(map.len() as f64);
    }

    /// Stop `session`'s poller for `session_id`. Returns false if that user
    /// was not watching it.
    pub async fn unwatch(&self, session_id: Uuid, session: &CurrentSession) -> bool {
        let mut map = self.inner.lock().await;
        let removed = map.remove(&(session_id, session.clone()));
        gauge!("active_session_watchers").set(map.len() as f64);

        match removed {
            Some(handle) => {
                handle.stop();
                tracing::info!(session_id = %session_id, "Session watcher stopped");
                true
            }
            None => false,
        }
    }

    /// Latest snapshot and whether the polls are still running.
    pub async fn snapshot(
        &self,
        session_id: Uuid,
        session: &CurrentSession,
    ) -> Option<(PollSnapshot, bool)> {
        let map = self.inner.lock().await;
        map.get(&(session_id, session.clone()))
            .map(|h| (h.snapshot(), !h.is_finished()))
    }

    pub async fn active_count(&self) -> usize {
        let map = self.inner.lock().await;
        map.values().filter(|h| !h.is_finished()).count()
    }

    /// Cancel every poller, e.g. on shutdown.
    pub async fn stop_all(&self) {
        let mut map = self.inner.lock().await;
        let count = map.len();
        map.clear();
        gauge!("active_session_watchers").set(0.0);
        if count > 0 {
            tracing::info!(count, "All session watchers stopped");
        }
    }
}
