// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

/// Spawn a task that notifies `shutdown` on SIGTERM or SIGINT
///
/// Uses `notify_one`, so a signal that arrives before the accept loop starts
/// waiting is kept as a permit instead of being lost.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(error = %e, "failed to register unix signal handlers, falling back to ctrl_c");
                    wait_for_ctrl_c(shutdown).await;
                    return;
                }
            };

        tracing::debug!(pid = std::process::id(), "signal handlers registered (SIGTERM, SIGINT)");

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("SIGTERM received"),
            _ = sigint.recv() => tracing::info!("SIGINT received"),
        }
        shutdown.notify_one();
    });
}

/// Non-unix fallback: only Ctrl+C is supported
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(wait_for_ctrl_c(shutdown));
}

async fn wait_for_ctrl_c(shutdown: Arc<Notify>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Ctrl+C received");
            shutdown.notify_one();
        }
        Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl+C"),
    }
}
