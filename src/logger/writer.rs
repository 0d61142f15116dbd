//! Log writer module
//!
//! Provides thread-safe log writing to files or stdout/stderr.
//! Access log writes report failures so the request path can react to them;
//! info and error writes are best effort.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use crate::config::LogLevel;

/// Global log writer instance, used for lifecycle messages
static LOG_WRITER: OnceLock<Arc<LogWriter>> = OnceLock::new();

/// Log output target
pub enum LogTarget {
    /// Write to stdout
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to file
    File(Mutex<File>),
}

impl LogTarget {
    /// Open or create `path` for appending, falling back to `default` when unset
    fn open(path: Option<&str>, default: Self) -> io::Result<Self> {
        match path {
            Some(p) => Ok(Self::File(Mutex::new(open_log_file(p)?))),
            None => Ok(default),
        }
    }

    fn write_line(&self, message: &str) -> io::Result<()> {
        match self {
            Self::Stdout => writeln!(io::stdout().lock(), "{message}"),
            Self::Stderr => writeln!(io::stderr().lock(), "{message}"),
            Self::File(file) => {
                let mut f = file
                    .lock()
                    .map_err(|_| io::Error::other("log file lock poisoned"))?;
                writeln!(f, "{message}")?;
                f.flush()
            }
        }
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    /// Access log target
    access: LogTarget,
    /// Error log target
    error: LogTarget,
    /// Most verbose lifecycle level still written
    level: LogLevel,
}

impl LogWriter {
    /// Create a new log writer with optional file paths
    pub fn new(access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        Ok(Self::with_targets(
            LogTarget::open(access_log_file, LogTarget::Stdout)?,
            LogTarget::open(error_log_file, LogTarget::Stderr)?,
        ))
    }

    pub const fn with_targets(access: LogTarget, error: LogTarget) -> Self {
        Self {
            access,
            error,
            level: LogLevel::Info,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    /// Write to access log; never filtered by level
    pub fn write_access(&self, message: &str) -> io::Result<()> {
        self.access.write_line(message)
    }

    /// Write a lifecycle message if `level` is enabled
    ///
    /// Errors and warnings go to the error target, the rest to the access target.
    pub fn write(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        let target = match level {
            LogLevel::Error | LogLevel::Warn => &self.error,
            LogLevel::Info | LogLevel::Debug => &self.access,
        };
        let _ = target.write_line(message);
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global log writer
///
/// This should be called once at application startup.
pub fn init(writer: Arc<LogWriter>) -> io::Result<()> {
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if installed
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get().map(Arc::as_ref)
}
