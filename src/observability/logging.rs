//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Write JSON lines to `<log dir>/proxy.log`, or to stderr
//! - Configure log level from config, overridable by `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Writes go through a non-blocking worker, so concurrent requests never
//!   interleave partial lines
//! - A log file that cannot be opened is not fatal; stderr is used instead

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Name of the log file inside the configured directory.
pub const LOG_FILE_NAME: &str = "proxy.log";

/// Install the global subscriber.
///
/// The returned guard flushes pending lines on drop and must be kept alive
/// for the life of the process.
pub fn init_logging(config: &ObservabilityConfig) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let mut file_error = None;
    let (writer, guard) = match config.log_dir.as_deref().map(open_log_file) {
        Some(Ok(appender)) => tracing_appender::non_blocking(appender),
        Some(Err(e)) => {
            file_error = Some(e);
            tracing_appender::non_blocking(std::io::stderr())
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(writer))
        .init();

    if let Some(e) = file_error {
        tracing::info!(err = %e, "Failed to log to file, using default stderr");
    }

    guard
}

/// Open `<dir>/proxy.log` for appending, creating it if needed.
pub fn open_log_file(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(dir)
}
