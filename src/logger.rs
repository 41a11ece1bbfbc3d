use std::result::Result;

use snafu::ResultExt;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{registry, EnvFilter};

use crate::config::Config;
use crate::error::{ApplicationError, InitializeLoggerSnafu};

/// Prefix of the daily log files; the appender adds the date.
const LOG_FILE_PREFIX: &str = "video-tracker.log";

const DEFAULT_FILTER: &str = "info";

/// Verbosity from `RUST_LOG`, falling back to [DEFAULT_FILTER] when it is
/// unset or unparsable.
fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Logs request and store events to stdout and to a daily JSON file under
/// `config.log_dir`.
///
/// The returned guard flushes the file writer when dropped, so keep it alive
/// for the whole process.
pub fn init(config: &Config) -> Result<WorkerGuard, ApplicationError> {
    let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let subscriber = registry()
        .with(filter())
        .with(layer().pretty().with_writer(std::io::stdout))
        .with(layer().with_ansi(false).json().with_writer(writer));

    tracing::subscriber::set_global_default(subscriber).context(InitializeLoggerSnafu)?;
    tracing::debug!(log_dir = %config.log_dir.display(), "logger initialized");

    Ok(guard)
}
