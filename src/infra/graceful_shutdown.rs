//! Graceful shutdown handling
//!
//! Resolves once the process receives Ctrl+C or SIGTERM so `axum::serve` can
//! stop accepting connections and drain in-flight requests.

use std::future::Future;

use tokio::signal;
use tracing::{info, warn};

/// Install signal handlers and return a future that completes on shutdown signal
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    shutdown_on(async {
        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                info!("Received SIGTERM, initiating shutdown...");
            }
        }
    })
    .await;
}

/// Resolve when `trigger` completes, logging the transition.
pub async fn shutdown_on<F>(trigger: F)
where
    F: Future<Output = ()>,
{
    trigger.await;
    info!("Initiating graceful shutdown...");
}
