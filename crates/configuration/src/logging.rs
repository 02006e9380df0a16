//! Tracing setup shared by every binary in the workspace.
//!
//! Report output goes to stdout, so log lines are written to stderr and,
//! optionally, to a daily-rolling file.

use crate::error::ConfigError;
use crate::settings::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Keeps the non-blocking file writer alive. Dropping it flushes pending lines.
#[derive(Debug)]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn init(settings: &LoggingSettings) -> Result<LoggingGuard, ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| ConfigError::Logging(format!("invalid level '{}': {e}", settings.level)))?;

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, file_guard) = match &settings.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                ConfigError::Logging(format!("cannot create {}: {e}", dir.display()))
            })?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "retail-insights.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::debug!(level = %settings.level, "Logging initialized");

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
