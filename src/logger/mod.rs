//! Logger module
//!
//! Provides logging utilities for the framework including:
//! - `tracing` subscriber setup driven by `logging.level`
//! - Startup, dispatch and error logging helpers
//! - Access logging with multiple formats, to stdout or a file

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use crate::routing::RouteTable;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize diagnostics and the access log writer
///
/// Should be called once at application startup. `RUST_LOG` takes precedence over
/// `logging.level` when set.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber installed earlier (tests, embedding applications) wins
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();

    writer::init(config.access_log_file.as_deref())
}

pub fn log_server_start(addr: &SocketAddr, adapter: &str, config: &Config) {
    tracing::info!(
        %addr,
        adapter,
        level = %config.logging.level,
        workers = ?config.server.workers,
        access_log = ?config.logging.access_log_file,
        "server started"
    );
}

pub fn log_routes(table: &RouteTable) {
    let mut entries: Vec<_> = table.iter().collect();
    entries.sort_by(|a, b| (&a.path, &a.method).cmp(&(&b.path, &b.method)));
    tracing::info!(count = table.len(), "route table loaded");
    for entry in entries {
        tracing::debug!(method = %entry.method, path = %entry.path, handler = %entry.handler, "route");
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(%peer_addr, "connection accepted");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!(error = ?err, "failed to serve connection");
}

pub fn log_routing_failure(method: &str, path: &str, message: &str) {
    tracing::debug!(method, path, "{message}");
}

pub fn log_handler_error(handler: &str, message: &str) {
    tracing::error!(handler, "handler failed: {message}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

pub fn log_shutdown() {
    tracing::info!("shutdown requested, no longer accepting connections");
}

/// Write an access log line in the configured format
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    writer::write_access(&entry.format(format));
}
