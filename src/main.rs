//! signalbox daemon: connects to the upstream feed and serves the
//! notification hub until interrupted.

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use signalbox_lib::notify::CommandNotifier;
use signalbox_lib::{Hub, HubConfig, HubError};

#[tokio::main]
async fn main() -> Result<(), HubError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = HubConfig::from_env()?;
    tracing::info!(url = %config.upstream_url, "starting signalbox");

    let hub = Hub::with_notifier(config, Arc::new(CommandNotifier::new()))?;
    hub.connect();

    shutdown_signal().await;
    tracing::info!("shutdown signal received; closing upstream connection");
    hub.disconnect();

    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
