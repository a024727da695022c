//! Standalone server: event bus, connection hub, notification bridge and
//! background scheduler wired over in-memory storage.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use unlimited_corp::adapters::events::InMemoryEventBus;
use unlimited_corp::adapters::storage::{InMemoryAgentDirectory, InMemoryTaskStore};
use unlimited_corp::adapters::websocket::{
    websocket_router, ConnectionHub, NotificationBridge, SessionSettings, WebSocketState,
};
use unlimited_corp::application::{BackgroundScheduler, TaskScheduler};
use unlimited_corp::config::{AppConfig, LogFormat, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_logging(&config.server)?;
    config.validate()?;

    let bus = Arc::new(InMemoryEventBus::with_history_capacity(
        config.event_bus.history_capacity,
    ));
    let hub = Arc::new(ConnectionHub::new(config.hub.broadcast_queue_capacity));
    let hub_handle = hub.start();

    let bridge = NotificationBridge::new_shared(hub.clone());
    bridge.start(&*bus);

    let agents = Arc::new(InMemoryAgentDirectory::new());
    let tasks = Arc::new(InMemoryTaskStore::new());
    let scheduler = Arc::new(
        TaskScheduler::new(agents, tasks.clone(), bus.clone())
            .with_batch_limit(config.scheduler.batch_limit),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = if config.scheduler.enabled {
        let background = BackgroundScheduler::new(scheduler, tasks, config.scheduler.interval());
        Some(tokio::spawn(async move { background.run(shutdown_rx).await }))
    } else {
        info!("Background scheduler disabled");
        None
    };

    let ws_state = WebSocketState::new(hub.clone(), SessionSettings::from(&config.hub));
    let app = Router::new()
        .merge(websocket_router().with_state(ws_state))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down");
    shutdown_tx.send_replace(true);
    if let Some(handle) = scheduler_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "Background scheduler task ended abnormally");
        }
    }
    bridge.stop(&*bus);
    hub.stop();
    if let Some(handle) = hub_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "Hub broadcast loop ended abnormally");
        }
    }
    info!(dropped_messages = hub.dropped_messages(), "Shutdown complete");

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(server: &ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match server.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.with_target(false).init(),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
