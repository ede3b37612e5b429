// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
//
// Non-Unix platforms only get Ctrl+C.

use std::sync::Arc;

use crate::config::AppState;
use crate::logger;

/// Spawn a task that requests shutdown on the first termination signal
pub fn start_signal_handler(state: Arc<AppState>) {
    tokio::spawn(async move {
        match wait_for_termination().await {
            Ok(signal) => {
                logger::log_shutdown_signal(signal);
                state.request_shutdown();
            }
            Err(e) => logger::log_error(&format!("Failed to register signal handlers: {e}")),
        }
    });
}

#[cfg(unix)]
async fn wait_for_termination() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}
