//! Signal handling for graceful shutdown.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wait for a shutdown signal (SIGINT or SIGTERM on Unix).
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to set up SIGINT handler");
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to set up SIGTERM handler");

    tokio::select! {
        _ = sigint.recv() => {
            info!(message = "Signal received.", signal = "SIGINT");
        }
        _ = sigterm.recv() => {
            info!(message = "Signal received.", signal = "SIGTERM");
        }
    }
}

/// Wait for ctrl-c on non-Unix platforms.
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!(message = "Signal received.", signal = "ctrl-c");
}

/// Return a token that is cancelled when a shutdown signal arrives.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        child.cancel();
    });

    token
}
