use std::net::SocketAddr;
use std::sync::Arc;

use hotelier_api::config::{LogFormat, ServerConfig};
use hotelier_api::router::build_app_router;
use hotelier_api::state::AppState;
use hotelier_reconcile::{Reconciler, ReconciliationScheduler, SchedulerConfig};
use hotelier_tenancy::{
    ConnectionManager, ConnectorConfig, DirectoryConfig, PgConnector, TenantDirectory,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "hotelier_api=debug,hotelier_reconcile=info,hotelier_tenancy=info,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    let connector_config = ConnectorConfig::from_env().expect("Invalid database configuration");
    let directory_config = DirectoryConfig::from_env().expect("Invalid tenant cache configuration");
    let scheduler_config = SchedulerConfig::from_env().expect("Invalid scheduler configuration");

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let subscriber = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => subscriber.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => subscriber.with(tracing_subscriber::fmt::layer()).init(),
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Connections ---
    let manager = Arc::new(ConnectionManager::new(Arc::new(PgConnector::new(
        connector_config,
    ))));
    let registry = manager
        .main_connection()
        .await
        .expect("Failed to connect to registry database");
    registry
        .ping()
        .await
        .expect("Registry database health check failed");
    tracing::info!("Registry database ready");

    let directory = Arc::new(TenantDirectory::new(Arc::clone(&manager), directory_config));

    // --- Reconciliation scheduler ---
    let scheduler = ReconciliationScheduler::new(
        Reconciler::new(Arc::clone(&directory)),
        scheduler_config,
    );
    scheduler.start().await;

    // --- App state ---
    let state = AppState {
        directory,
        scheduler: Arc::clone(&scheduler),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // In-flight passes finish their current stay before connections close.
    scheduler.shutdown().await;
    manager.close_all().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
