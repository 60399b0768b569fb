use serde::Serialize;
use uuid::Uuid;

use crate::backend::CurrentSession;
use crate::intelligence::ScanProgress;
use crate::models::{QueryLog, ScanSession, ScanStatus};

/// Messages broadcast to all connected WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "session_update")]
    SessionUpdate(SessionUpdate),

    #[serde(rename = "logs_update")]
    LogsUpdate(LogsUpdate),

    #[serde(rename = "poll_error")]
    PollError(PollErrorData),

    #[serde(rename = "poll_stopped")]
    PollStopped(PollStoppedData),
}

impl WsMessage {
    pub fn session_id(&self) -> Uuid {
        match self {
            WsMessage::SessionUpdate(u) => u.session.id,
            WsMessage::LogsUpdate(u) => u.session_id,
            WsMessage::PollError(e) => e.session_id,
            WsMessage::PollStopped(s) => s.session_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    pub session: ScanSession,
    pub progress: ScanProgress,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogsUpdate {
    pub session_id: Uuid,
    pub logs: Vec<QueryLog>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollErrorData {
    pub session_id: Uuid,
    pub resource: &'static str,
    pub error: String,
}

/// Why a poll stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The session reached a terminal status.
    Terminal,
    /// The backend rejected the owner's token. The view must re-authenticate.
    Unauthorized,
    /// The session is gone or not visible to the owner.
    NotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct PollStoppedData {
    pub session_id: Uuid,
    pub resource: &'static str,
    pub reason: StopReason,
    /// Last status seen, if any fetch succeeded.
    pub status: Option<ScanStatus>,
}

/// A `WsMessage` tagged with the session it was fetched for. Only sockets
/// opened with the same credentials receive it.
#[derive(Debug, Clone)]
pub struct ScopedMessage {
    pub owner: CurrentSession,
    pub message: WsMessage,
}

impl ScopedMessage {
    pub fn visible_to(&self, viewer: &CurrentSession) -> bool {
        &self.owner == viewer
    }
}
