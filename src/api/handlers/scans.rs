use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{ApiResponse, ApiResult};
use crate::backend::CurrentSession;
use crate::errors::AppError;
use crate::intelligence::{scan_progress, validate_scan, ScanProgress};
use crate::models::{QueryLog, ScanRequest, ScanSession};
use crate::services::export_query_logs;
use crate::AppState;

/// Sessions looked at when counting today's scans against the daily limit.
const RECENT_SESSIONS: u32 = 100;

fn started_on(session: &ScanSession, day: NaiveDate) -> bool {
    session
        .created_at
        .is_some_and(|t| t.date_naive() == day)
}

/// POST /api/scans: validate, start the scan, and begin watching it.
pub async fn create(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(body): Json<ScanRequest>,
) -> ApiResult<ScanSession> {
    let today = Utc::now().date_naive();
    let recent = state.backend.list_sessions(&session, RECENT_SESSIONS).await?;
    let scans_today = recent.iter().filter(|s| started_on(s, today)).count() as u32;

    validate_scan(&body, today, scans_today, state.config.scan_daily_limit)?;

    let created = state.backend.create_scan(&session, &body).await?;
    tracing::info!(
        session_id = %created.id,
        check_in = %body.check_in,
        check_out = %body.check_out,
        adults = body.adults,
        "Scan started"
    );

    state
        .watchers
        .watch(
            state.backend.clone(),
            session,
            created.id,
            state.ws_tx.clone(),
        )
        .await;

    Ok(ApiResponse::ok(created))
}

#[derive(Debug, Serialize)]
pub struct ScanDetail {
    pub session: ScanSession,
    pub progress: ScanProgress,
}

/// GET /api/scans/:id: session plus derived progress. Progress falls back
/// to zero processed lookups when the logs cannot be fetched.
pub async fn detail(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<ScanDetail> {
    let (scan, logs) = tokio::join!(
        state.backend.get_session(&session, id),
        state.backend.session_logs(&session, id),
    );
    let scan = scan?;
    let logs = logs.unwrap_or_else(|e| {
        tracing::warn!(session_id = %id, error = %e, "Failed to fetch logs for progress");
        Vec::new()
    });

    let progress = scan_progress(&scan, &logs);
    Ok(ApiResponse::ok(ScanDetail {
        session: scan,
        progress,
    }))
}

/// GET /api/scans/:id/logs
pub async fn logs(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<QueryLog>> {
    let logs = state.backend.session_logs(&session, id).await?;
    Ok(ApiResponse::ok(logs))
}

/// GET /api/scans/:id/export.csv
pub async fn export_csv(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let logs = state.backend.session_logs(&session, id).await?;
    let body = export_query_logs(&logs);
    let disposition = format!("attachment; filename=\"scan-{id}.csv\"");

    tracing::info!(session_id = %id, rows = logs.len(), "Scan logs exported");
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

#[derive(Debug, Serialize)]
pub struct WatchStatus {
    pub session_id: Uuid,
    pub active: bool,
    pub session: Option<ScanSession>,
    pub logs_count: usize,
}

/// POST /api/scans/:id/watch: poll the session and stream updates over /ws.
/// The caller must be able to read the session before a poller is started.
pub async fn watch(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<WatchStatus> {
    let scan = state.backend.get_session(&session, id).await?;

    state
        .watchers
        .watch(state.backend.clone(), session, id, state.ws_tx.clone())
        .await;

    Ok(ApiResponse::ok(WatchStatus {
        session_id: id,
        active: true,
        session: Some(scan),
        logs_count: 0,
    }))
}

/// GET /api/scans/:id/watch: what the caller's poller has seen so far.
pub async fn watch_status(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<WatchStatus> {
    let (snapshot, active) = state
        .watchers
        .snapshot(id, &session)
        .await
        .ok_or_else(|| AppError::NotFound(format!("no watcher for session {id}")))?;

    Ok(ApiResponse::ok(WatchStatus {
        session_id: id,
        active,
        logs_count: snapshot.logs.len(),
        session: snapshot.session,
    }))
}

/// DELETE /api/scans/:id/watch
pub async fn unwatch(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> ApiResult<Uuid> {
    if state.watchers.unwatch(id, &session).await {
        Ok(ApiResponse::ok(id))
    } else {
        Err(AppError::NotFound(format!("no watcher for session {id}")))
    }
}
