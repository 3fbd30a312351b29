//! Tracing setup: stderr output filtered by `RUST_LOG` plus an optional
//! rolling log file.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

const DEFAULT_FILTER: &str = "codenav=info";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Flushes buffered log lines when dropped; keep it alive until exit.
#[must_use = "Dropping this guard will stop logging - keep it alive for the program's lifetime"]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Install the global subscriber described by `config`.
///
/// Relative log directories resolve against `base_dir`.
pub fn init_logging(config: &LoggingConfig, base_dir: &Path) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guards = Vec::new();

    if config.enabled {
        let log_dir = resolve_log_dir(&config.directory, base_dir);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let appender = RollingFileAppender::new(
            parse_rotation(&config.rotation),
            &log_dir,
            &config.file_prefix,
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(parse_level(&config.level))
                .boxed(),
        );
    }

    if config.stderr {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
        guards.push(guard);

        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_filter(stderr_filter())
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to initialize logging subscriber")?;

    Ok(LoggingGuard { _guards: guards })
}

/// Best-effort stderr logging used before the configuration is loaded.
pub fn init_early_logging() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_filter(stderr_filter()))
        .try_init();
}

fn stderr_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn resolve_log_dir(directory: &Path, base_dir: &Path) -> PathBuf {
    if directory.is_absolute() {
        directory.to_path_buf()
    } else {
        base_dir.join(directory)
    }
}

fn parse_level(level: &str) -> EnvFilter {
    let level = match level.to_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error") => l.to_string(),
        other => {
            eprintln!("Warning: Unknown log level '{}', defaulting to 'debug'", other);
            "debug".to_string()
        }
    };
    EnvFilter::new(format!("codenav={}", level))
}

fn parse_rotation(rotation: &str) -> Rotation {
    match rotation.to_lowercase().as_str() {
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        "never" => Rotation::NEVER,
        other => {
            eprintln!(
                "Warning: Unknown rotation strategy '{}', defaulting to 'daily'",
                other
            );
            Rotation::DAILY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("warn").to_string(), "codenav=warn");
        assert_eq!(parse_level("TRACE").to_string(), "codenav=trace");
        assert_eq!(parse_level("loud").to_string(), "codenav=debug");
    }

    #[test]
    fn test_parse_rotation_accepts_unknown() {
        // Rotation has no PartialEq
        for name in ["minutely", "hourly", "daily", "never", "weekly"] {
            let _ = parse_rotation(name);
        }
    }

    #[test]
    fn test_resolve_log_dir() {
        let base = Path::new("/srv/app");
        assert_eq!(
            resolve_log_dir(Path::new("logs"), base),
            Path::new("/srv/app/logs")
        );
        assert_eq!(
            resolve_log_dir(Path::new("/var/log/codenav"), base),
            Path::new("/var/log/codenav")
        );
    }
}
