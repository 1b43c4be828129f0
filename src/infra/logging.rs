use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "assetbox";
const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir { path: String, source: io::Error },

    #[error("failed to open log file in {path}: {message}")]
    OpenFile { path: String, message: String },

    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

fn log_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("logs")
}

/// Routes `tracing` output to a daily log file under the state dir. The terminal belongs
/// to the UI, so nothing is written to stdout or stderr.
///
/// The returned guard flushes buffered lines on drop; keep it alive until exit.
pub fn init_logging(state_dir: &Path) -> Result<WorkerGuard, LoggingError> {
    let appender = open_log_appender(state_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(resolve_filter(|key| std::env::var(key).ok()))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|error| LoggingError::Install(error.to_string()))?;

    tracing::info!("{} v{} starting", LOG_FILE_PREFIX, env!("CARGO_PKG_VERSION"));
    Ok(guard)
}

fn open_log_appender(state_dir: &Path) -> Result<RollingFileAppender, LoggingError> {
    let dir = log_dir(state_dir);
    std::fs::create_dir_all(&dir).map_err(|error| LoggingError::CreateDir {
        path: dir.display().to_string(),
        source: error,
    })?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&dir)
        .map_err(|error| LoggingError::OpenFile {
            path: dir.display().to_string(),
            message: error.to_string(),
        })
}

fn resolve_filter(env: impl Fn(&str) -> Option<String>) -> EnvFilter {
    ["ASSETBOX_LOG", "RUST_LOG"]
        .into_iter()
        .filter_map(|key| env(key))
        .find_map(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
