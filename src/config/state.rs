// Application state module
// Shared, read-only state handed to every connection

use std::sync::Arc;

use super::types::Config;
use crate::logger::LogWriter;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Access log sink; write failures turn the response into a 500
    pub log_writer: Arc<LogWriter>,
}

impl AppState {
    pub const fn new(config: Config, log_writer: Arc<LogWriter>) -> Self {
        Self { config, log_writer }
    }
}
