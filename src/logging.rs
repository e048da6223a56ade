use crate::error::{EtlError, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "training_etl";
const LOG_FILE_SUFFIX: &str = "log";
const DEFAULT_FILTER: &str = "training_etl=info";

/// Sets up console output plus a daily-rotated JSON log under `log_dir`.
///
/// The returned guard flushes the file writer when dropped; keep it alive for the
/// whole process. `RUST_LOG` overrides the default `training_etl=info` filter.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    let appender = file_appender(log_dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(file_writer);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| EtlError::configuration(format!("Logging already initialized: {e}")))?;

    Ok(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn file_appender(log_dir: &Path) -> Result<RollingFileAppender> {
    fs::create_dir_all(log_dir).map_err(|e| {
        EtlError::configuration(format!(
            "Cannot create log directory '{}': {}",
            log_dir.display(),
            e
        ))
    })?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .build(log_dir)
        .map_err(|e| {
            EtlError::configuration(format!(
                "Cannot open log file in '{}': {}",
                log_dir.display(),
                e
            ))
        })
}
