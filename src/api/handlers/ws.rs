use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::ws_types::ScopedMessage;
use crate::backend::CurrentSession;
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Only forward events for this scan session.
    pub session_id: Option<Uuid>,
}

/// GET /ws: stream poll events for the caller's own watchers.
///
/// A `session_id` filter is checked against the backend before upgrading,
/// so a session the caller cannot read is refused with its HTTP error.
pub async fn handler(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(params): Query<WsParams>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    if let Some(id) = params.session_id {
        state.backend.get_session(&session, id).await?;
    }

    Ok(match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| handle_socket(socket, state, session, params.session_id))
            .into_response(),
        Err(rejection) => rejection.into_response(),
    })
}

/// Whether `viewer`, filtering on `filter`, should receive `msg`.
fn should_forward(msg: &ScopedMessage, viewer: &CurrentSession, filter: Option<Uuid>) -> bool {
    msg.visible_to(viewer) && filter.map_or(true, |id| id == msg.message.session_id())
}

async fn handle_socket(
    mut socket: WebSocket,
    state: AppState,
    viewer: CurrentSession,
    filter: Option<Uuid>,
) {
    tracing::info!(session_filter = ?filter, "Dashboard WebSocket client connected");

    let mut rx = state.ws_tx.subscribe();

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(scoped) => {
                        if !should_forward(&scoped, &viewer, filter) {
                            continue;
                        }
                        match serde_json::to_string(&scoped.message) {
                            Ok(json) => {
                                if socket.send(Message::Text(json)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to serialize WsMessage");
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Dashboard WS client lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            client_msg = socket.recv() => {
                match client_msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    tracing::info!("Dashboard WebSocket client disconnected");
}
