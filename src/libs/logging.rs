//! Logging set-up.
//!
//! The background process writes a daily rolling `overlay.log` in the
//! application data directory and mirrors warnings to stderr. Interactive
//! commands log to stderr only. `RUST_LOG` overrides the default `info` level
//! in both cases.

use crate::libs::messages::macros::route_to_tracing;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const LOG_FILE_NAME: &str = "overlay.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the file logger used by `--background`.
///
/// Keep the returned guard alive for the lifetime of the process; dropping it
/// flushes and stops the writer thread.
pub fn init_background(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir).with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::from_level(Level::WARN)),
        )
        .try_init()
        .context("installing the background logger")?;

    route_to_tracing();
    Ok(guard)
}

/// Installs a stderr logger for interactive commands. A second call is a no-op.
pub fn init_console() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
