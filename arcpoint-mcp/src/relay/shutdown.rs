//! Signal handling for the relay process.

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancel `shutdown` on SIGINT, and on SIGTERM where supported.
///
/// Each handler runs in its own task and fires at most once.
pub fn install_signal_handlers(shutdown: &CancellationToken) {
    let shutdown_sigint = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C), shutting down");
                shutdown_sigint.cancel();
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGINT");
            }
        }
    });

    #[cfg(unix)]
    {
        let shutdown_sigterm = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    info!("Received SIGTERM, shutting down");
                    shutdown_sigterm.cancel();
                }
                Err(e) => {
                    error!(error = %e, "Failed to listen for SIGTERM");
                }
            }
        });
    }
}
