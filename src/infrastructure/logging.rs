//! Centralized logging
//!
//! Console output always; when file logging is enabled, rolling files under
//! the configured directory, separated by concern:
//! - main/  - every event, JSON
//! - error/ - WARN and ERROR only
//! - feed/  - publisher and tick loop
//! - gateway/ - client connections and broadcasts

use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::infrastructure::config::LoggingConfig;

/// Per-concern log files
const LOG_TYPES: [&str; 4] = ["main", "error", "feed", "gateway"];

/// Initialize logging
///
/// Returns the WorkerGuards which must be kept alive for the duration of the
/// program. Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> std::io::Result<Vec<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    if !config.file_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer())
            .try_init()
            .map_err(std::io::Error::other)?;
        return Ok(Vec::new());
    }

    create_log_dirs(&config.directory)?;

    let mut guards = Vec::new();
    let dir = &config.directory;

    let (main_appender, main_guard) = create_appender(&dir.join("main"), "main");
    guards.push(main_guard);
    let (error_appender, error_guard) = create_appender(&dir.join("error"), "error");
    guards.push(error_guard);
    let (feed_appender, feed_guard) = create_appender(&dir.join("feed"), "feed");
    guards.push(feed_guard);
    let (gateway_appender, gateway_guard) = create_appender(&dir.join("gateway"), "gateway");
    guards.push(gateway_guard);

    let main_layer = tracing_subscriber::fmt::layer()
        .with_writer(main_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json();

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    let feed_layer = tracing_subscriber::fmt::layer()
        .with_writer(feed_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            is_feed_target(metadata.target())
        }));

    let gateway_layer = tracing_subscriber::fmt::layer()
        .with_writer(gateway_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            is_gateway_target(metadata.target())
        }));

    tracing_subscriber::registry()
        .with(filter)
        .with(main_layer)
        .with(error_layer)
        .with(feed_layer)
        .with(gateway_layer)
        .with(console_layer())
        .try_init()
        .map_err(std::io::Error::other)?;

    tracing::info!("Logging initialized. Log files in {}", dir.display());

    Ok(guards)
}

/// Human-readable console output
fn console_layer<S>() -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
}

fn create_log_dirs(root: &Path) -> std::io::Result<()> {
    for log_type in LOG_TYPES {
        fs::create_dir_all(root.join(log_type))?;
    }
    Ok(())
}

/// Create a daily rolling file appender
fn create_appender(dir: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, name);
    tracing_appender::non_blocking(appender)
}

fn is_feed_target(target: &str) -> bool {
    target.contains("feed") || target.contains("engine")
}

fn is_gateway_target(target: &str) -> bool {
    target.contains("gateway") || target.contains("api")
}

/// Log macro helpers for specific log targets
#[macro_export]
macro_rules! log_feed {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "feed", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_gateway {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "gateway", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_api {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "api", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_main {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "main", $level, $($arg)+)
    };
}
