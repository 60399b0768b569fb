pub mod api;
pub mod backend;
pub mod config;
pub mod errors;
pub mod intelligence;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::api::ws_types::ScopedMessage;
use crate::backend::RateBackend;
use crate::config::AppConfig;
use crate::services::WatchRegistry;

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn RateBackend>,
    pub config: AppConfig,
    pub ws_tx: broadcast::Sender<ScopedMessage>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub watchers: WatchRegistry,
}
