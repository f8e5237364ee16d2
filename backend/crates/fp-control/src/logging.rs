//! Logging setup with file rotation.

use std::path::Path;

use fp_config::{ConfigError, ConfigErrorResult};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "fpctl";
const MAX_LOG_FILES: usize = 7;

/// Setup logging with console and rotating file output.
///
/// # Log Layers
/// - Console: stderr, so command output on stdout stays clean
/// - File: plain text, daily rotation, 7-day retention
///
/// `RUST_LOG` wins over `level` when set.
pub fn setup_logging(log_dir: &Path, level: &str) -> ConfigErrorResult<()> {
    std::fs::create_dir_all(log_dir).map_err(|e| ConfigError::io(log_dir, e))?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| ConfigError::logging(format!("Failed to create log file appender: {e}")))?;

    let file_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false)
        .with_writer(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ConfigError::logging(format!("Invalid log level '{level}': {e}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::logging(format!("Logging already initialized: {e}")))?;

    Ok(())
}
