use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

use crate::errors::{ConfigError, Result};

pub const LOG_FILE: &str = "quantumcraft.log";

/// Install the global subscriber: stderr plus `logs/quantumcraft.log`.
///
/// `RUST_LOG` overrides `default_filter`. Keep the returned guard alive for
/// the life of the process, dropping it flushes the file writer.
pub fn init(logs_dir: &Path, default_filter: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .context("Failed to create logs directory")
        .map_err(|e| ConfigError::DirectoryCreationFailed {
            path: logs_dir.to_path_buf(),
            source: e,
        })?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_appender = tracing_appender::rolling::never(logs_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .context("A global subscriber is already installed")
        .map_err(|e| ConfigError::LoggingInitFailed { source: e })?;

    Ok(guard)
}
