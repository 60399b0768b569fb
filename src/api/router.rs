use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::render_metrics));

    // Protected API routes act on behalf of the caller's session
    let protected = Router::new()
        // Hotels
        .route("/api/hotels", get(handlers::hotels::list).post(handlers::hotels::create))
        .route(
            "/api/hotels/:id",
            patch(handlers::hotels::update).delete(handlers::hotels::remove),
        )
        .route("/api/hotels/:id/target", post(handlers::hotels::set_target))
        // Rates
        .route("/api/rates/grid", get(handlers::rates::grid))
        .route("/api/rates/vendors/toggle", post(handlers::rates::toggle_vendor))
        .route("/api/rates/daily", get(handlers::rates::daily))
        .route("/api/rates/intraday", get(handlers::rates::intraday))
        // Scans
        .route("/api/scans", post(handlers::scans::create))
        .route("/api/scans/:id", get(handlers::scans::detail))
        .route("/api/scans/:id/logs", get(handlers::scans::logs))
        .route("/api/scans/:id/export.csv", get(handlers::scans::export_csv))
        .route(
            "/api/scans/:id/watch",
            get(handlers::scans::watch_status)
                .post(handlers::scans::watch)
                .delete(handlers::scans::unwatch),
        )
        // Reports
        .route("/api/reports", get(handlers::reports::summary))
        // Directory
        .route("/api/directory/search", get(handlers::directory::search))
        // WebSocket
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn(require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
