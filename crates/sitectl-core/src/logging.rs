//! Tracing subscriber setup.
//!
//! One-shot commands log to stderr. The dashboard owns the terminal, so it
//! logs to a file through a non-blocking appender instead.

use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "SITECTL_LOG";

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// stderr; only warnings and errors unless `verbose`.
    Stderr { verbose: bool },
    /// Append to a file.
    File(PathBuf),
}

/// Keeps the background writer alive. Drop it on exit to flush.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

/// Builds the filter: SITECTL_LOG > quiet stderr default > config level.
fn build_filter(config: &LoggingConfig, target: &LogTarget) -> Result<EnvFilter> {
    if let Ok(directive) = std::env::var(LOG_ENV)
        && !directive.trim().is_empty()
    {
        return EnvFilter::try_new(directive.trim())
            .with_context(|| format!("Invalid {LOG_ENV} filter: {directive}"));
    }

    let directive = match target {
        LogTarget::Stderr { verbose: false } => "warn",
        _ => config.level.trim(),
    };
    EnvFilter::try_new(directive).with_context(|| format!("Invalid log level: {directive}"))
}

/// Installs the global subscriber.
///
/// # Errors
/// Returns an error if the filter is invalid, the log file cannot be opened,
/// or a subscriber is already installed.
pub fn init(config: &LoggingConfig, target: &LogTarget) -> Result<LogGuard> {
    let filter = build_filter(config, target)?;

    match target {
        LogTarget::Stderr { .. } => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(std::io::stderr().is_terminal())
                        .with_target(false),
                )
                .try_init()
                .context("Failed to install log subscriber")?;
            Ok(LogGuard { _worker: None })
        }
        LogTarget::File(path) => {
            let dir = path
                .parent()
                .map_or_else(|| PathBuf::from("."), PathBuf::from);
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .context("Log file path has no file name")?;
            let appender = tracing_appender::rolling::never(&dir, file_name);
            let (writer, worker) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .try_init()
                .context("Failed to install log subscriber")?;
            Ok(LogGuard {
                _worker: Some(worker),
            })
        }
    }
}
