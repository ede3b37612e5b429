//! Logger module
//!
//! Provides logging utilities for the invocation host including:
//! - Subscriber setup (`tracing-subscriber`, text or JSON, stdout or file)
//! - Server lifecycle logging
//! - Invocation outcome logging
//! - Access logging with multiple formats

mod format;

pub use format::AccessLogEntry;

use std::fs::{File, OpenOptions};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::{AppState, LogFormat, LoggingConfig};
use crate::invocation::InvocationError;

/// Target used for access log lines, e.g. `RUST_LOG=access=off`
pub const ACCESS_TARGET: &str = "access";

/// Install the global subscriber
///
/// Should be called once at application startup. `RUST_LOG` takes
/// precedence over `logging.level`.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let writer = match config.log_file.as_deref() {
        Some(path) => BoxMakeWriter::new(Mutex::new(open_log_file(path)?)),
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_ansi(config.log_file.is_none()).try_init(),
    };
    installed.map_err(|e| -> Box<dyn std::error::Error> { e })
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> std::io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

pub fn log_server_start(addr: &SocketAddr, state: &AppState) {
    let config = &state.config;
    tracing::info!("======================================");
    tracing::info!("Invocation host started successfully");
    tracing::info!("Listening on: http://{addr}");
    for path in &config.routes.invoke_paths {
        tracing::info!("  - POST http://{addr}{path}");
    }
    tracing::info!("Function: {} -> {}", config.function.name, state.handler.url());
    tracing::info!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some(ref path) = config.logging.log_file {
        tracing::info!("Log file: {path}");
    }
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("[WARN] {message}");
}

pub fn log_invocation(request_id: &str, elapsed: Duration) {
    tracing::info!(
        request_id,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "[Invoke] Completed"
    );
}

pub fn log_invocation_error(request_id: &str, err: &InvocationError) {
    tracing::error!(
        request_id,
        error_type = err.error_type(),
        "[Invoke] Failed: {err}"
    );
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}

pub fn log_shutdown_signal(signal: &str) {
    tracing::info!("[Shutdown] {signal} received, no longer accepting connections");
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        tracing::info!("[Shutdown] All connections closed");
    } else {
        tracing::warn!("[Shutdown] Grace period elapsed with {remaining} connection(s) still open");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logs/greeter.log");

        let file = open_log_file(path.to_str().unwrap());

        assert!(file.is_ok());
        assert!(path.exists());
    }
}
