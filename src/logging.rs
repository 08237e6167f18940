//! Tracing initialization.
//!
//! The TUI owns stdout, so events are written to a log file instead of the
//! terminal. `RUST_LOG` takes precedence over the configured level:
//!
//! ```bash
//! RUST_LOG=moodscribe=debug moodscribe
//! ```

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to open log file {path}: {source}")]
    OpenLogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Build the filter from `RUST_LOG`, falling back to `default_level`
fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|_| LoggingError::InvalidFilter(default_level.to_string()))
}

/// Install a subscriber that appends to `log_path`
pub fn init_file_logging(log_path: &Path, default_level: &str) -> Result<(), LoggingError> {
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| LoggingError::OpenLogFile {
                path: log_path.display().to_string(),
                source,
            })?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|source| LoggingError::OpenLogFile {
            path: log_path.display().to_string(),
            source,
        })?;

    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(create_env_filter(default_level)?)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

/// Install a subscriber that writes to stderr (one-shot CLI commands)
pub fn init_stderr_logging(default_level: &str) -> Result<(), LoggingError> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(create_env_filter(default_level)?)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}
