//! Stop — external shutdown signal.

use tracing::info;

/// Resolve when the process receives Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler the only way out is external kill;
        // park forever rather than shutting down spuriously.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
