use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use metrics::gauge;
use serde_json::json;

use crate::AppState;

/// Liveness only. The backend is checked per request with the caller's
/// own credentials, so there is nothing meaningful to probe here.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let watchers = state.watchers.active_count().await;
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "active_watchers": watchers })),
    )
}

/// Prometheus scrape endpoint.
pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    // Finished pollers leave the registry lazily; report the live count.
    let watchers = state.watchers.active_count().await;
    gauge!("active_session_watchers").set(watchers as f64);

    let body = state.metrics_handle.render();
    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}
