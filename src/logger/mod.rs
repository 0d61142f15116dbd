//! Logger module
//!
//! Provides logging utilities for the demo server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;
pub use writer::LogWriter;

use crate::config::{Config, LogLevel};
use std::net::SocketAddr;
use std::sync::Arc;

/// Initialize the logger with configuration
///
/// Opens the configured log files and installs the writer globally.
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<Arc<LogWriter>> {
    let writer = Arc::new(
        LogWriter::new(
            config.logging.access_log_file.as_deref(),
            config.logging.error_log_file.as_deref(),
        )?
        .with_level(config.logging.level),
    );
    writer::init(Arc::clone(&writer))?;
    Ok(writer)
}

/// Write a lifecycle message through the global writer
///
/// Before `init` (and in tests) everything goes to stdout/stderr unfiltered.
fn write(level: LogLevel, message: &str) {
    match writer::get() {
        Some(w) => w.write(level, message),
        None if level <= LogLevel::Warn => eprintln!("{message}"),
        None => println!("{message}"),
    }
}

fn write_info(message: &str) {
    write(LogLevel::Info, message);
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Cache demo server started successfully");
    write_info(&format!("Server running at http://{addr}/"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================");
}

pub fn log_route(addr: &SocketAddr, path: &str, cache_control: &str) {
    write_info(&format!("  http://{addr}{path:<20} Cache-Control: {cache_control}"));
}

pub fn log_info(message: &str) {
    write_info(&format!("[INFO] {message}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write(LogLevel::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write(LogLevel::Error, &format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write(LogLevel::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write(LogLevel::Warn, &format!("[WARN] {message}"));
}

pub fn log_shutdown() {
    write_info("[Shutdown] Listener closed, server stopping");
}

/// Write a formatted access log entry to `writer`
pub fn log_access(
    writer: &LogWriter,
    entry: &AccessLogEntry,
    format: &str,
) -> std::io::Result<()> {
    writer.write_access(&entry.format(format))
}
