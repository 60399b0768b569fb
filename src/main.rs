use std::sync::Arc;

use tokio::sync::broadcast;

use ratewatch::api::router::create_router;
use ratewatch::api::ws_types::ScopedMessage;
use ratewatch::backend::BackendClient;
use ratewatch::config::AppConfig;
use ratewatch::services::WatchRegistry;
use ratewatch::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = ratewatch::metrics::init_metrics();

    let backend = BackendClient::new(&config.backend_url, config.request_timeout())?;
    tracing::info!(
        backend_url = %config.backend_url,
        timeout_secs = config.request_timeout_secs,
        "Backend client ready"
    );

    // --- WebSocket broadcast channel for dashboard ---
    let (ws_tx, _) = broadcast::channel::<ScopedMessage>(256);
    let watchers = WatchRegistry::new(config.poll_interval());

    let state = AppState {
        backend: Arc::new(backend),
        config,
        ws_tx,
        metrics_handle,
        watchers: watchers.clone(),
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    watchers.stop_all().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
