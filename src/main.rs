use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use live_relay::adapters::http::app_router;
use live_relay::adapters::{ClientHub, WebSocketState, WebcastSource};
use live_relay::application::SessionManager;
use live_relay::config::{AppConfig, ConfigError, LogFormat, ServerConfig};

/// Errors that stop the relay before or while serving.
#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate().map_err(ConfigError::from)?;

    let source = Arc::new(WebcastSource::from_config(&config.upstream));
    let sessions = Arc::new(
        SessionManager::new(source).with_connect_announcement(config.upstream.announce_connected),
    );
    let hub = Arc::new(
        ClientHub::new(Arc::clone(&sessions))
            .with_outbox_capacity(config.server.client_queue_capacity),
    );
    let app = app_router(WebSocketState::new(hub), &config.server.cors_origins);

    let addr = config.server.socket_addr().map_err(ConfigError::from)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(
        upstream = %config.upstream.endpoint,
        log_format = ?config.server.log_format,
        "Server is running on port {}",
        config.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if sessions.disconnect().await {
        tracing::info!("Disconnected from upstream");
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match server.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
