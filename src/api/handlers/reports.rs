use axum::extract::State;
use axum::Extension;
use chrono::Utc;
use futures_util::future::join_all;

use super::{ApiResponse, ApiResult};
use crate::backend::CurrentSession;
use crate::intelligence::{build_report, ReportSummary};
use crate::AppState;

const REPORT_SESSIONS: u32 = 20;

/// GET /api/reports: weekly summary plus a rollup per recent session.
pub async fn summary(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> ApiResult<ReportSummary> {
    let sessions = state.backend.list_sessions(&session, REPORT_SESSIONS).await?;

    let fetches = sessions
        .iter()
        .map(|s| state.backend.session_logs(&session, s.id));
    let logs = join_all(fetches).await;

    let entries: Vec<_> = sessions
        .into_iter()
        .zip(logs)
        .map(|(scan, logs)| {
            let logs = logs
                .inspect_err(|e| {
                    tracing::warn!(session_id = %scan.id, error = %e, "Report: logs unavailable");
                })
                .ok();
            (scan, logs)
        })
        .collect();

    Ok(ApiResponse::ok(build_report(&entries, Utc::now())))
}
