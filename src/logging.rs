use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "adaptive-learning-backend.log";
const RECORDER_TARGET: &str = "adaptive_learning_backend::recorder";

/// Keeps the non-blocking file writer alive; logs stop flushing once dropped.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Global level from `log_level`, plus a directive for the recorder target
/// unless `log_level` already names it.
pub fn build_filter(config: &Config) -> EnvFilter {
    let mut directives = config.log_level.trim().to_string();
    if directives.is_empty() {
        directives = "info".to_string();
    }
    if !directives.contains(RECORDER_TARGET) {
        directives = format!("{directives},{RECORDER_TARGET}={}", config.recorder_log_level.trim());
    }

    EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        eprintln!("invalid log filter {directives:?}: {err}; falling back to info");
        EnvFilter::new("info")
    })
}

pub fn init_tracing(config: &Config) -> Option<FileLogGuard> {
    let registry = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(fmt::layer().with_target(true));

    if !config.file_logs {
        registry.init();
        return None;
    }

    if let Err(err) = std::fs::create_dir_all(&config.log_dir) {
        eprintln!("failed to create log directory {}: {err}", config.log_dir.display());
        registry.init();
        return None;
    }

    let appender = RollingFileAppender::new(Rotation::DAILY, &config.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        .init();

    Some(FileLogGuard { _guard: guard })
}
