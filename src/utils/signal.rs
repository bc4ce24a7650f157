use tracing::{debug, warn};

/// Resolves on the first Ctrl-C. If the handler cannot be installed the
/// future never resolves, so a batch is not cancelled by accident.
pub async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => debug!("Received Ctrl-C"),
        Err(e) => {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
