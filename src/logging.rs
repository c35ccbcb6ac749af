//! Logging setup.

use std::path::Path;

use anyhow::{Context, Result};
use bracket_config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer, Registry};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level`. When `config.file` is set, a daily-rotated
/// file receives the same events without ANSI colours; the returned guard
/// must be held until exit so buffered lines are flushed.
pub fn setup_logging(level: &str, json: bool, config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    if json {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(fmt::layer().pretty().with_writer(std::io::stderr).boxed());
    }

    let guard = match &config.file {
        Some(path) => {
            let path = Path::new(path);
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .context("logging.file must name a file")?;
            std::fs::create_dir_all(directory)
                .with_context(|| format!("creating log directory {}", directory.display()))?;
            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = fmt::layer().with_ansi(false).with_writer(writer);
            if json {
                layers.push(file_layer.json().boxed());
            } else {
                layers.push(file_layer.boxed());
            }
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .context("installing log subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_logging_with_file() {
        let dir = std::env::temp_dir().join(format!("bracket-logs-{}", std::process::id()));
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
            file: Some(dir.join("bracket.log").to_string_lossy().into_owned()),
        };

        let guard = setup_logging("debug", true, &config).unwrap();
        assert!(guard.is_some());
        assert!(dir.is_dir());
        tracing::info!("logging installed");

        // The global subscriber can only be installed once.
        assert!(setup_logging("info", false, &LoggingConfig::default()).is_err());
        drop(guard);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
