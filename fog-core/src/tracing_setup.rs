//! Tracing setup for the FOG media services
//!
//! Console output follows the level chosen on the command line (or
//! `RUST_LOG`); a second layer records everything to a per-run file so
//! record/storage drift and upstream failures can be traced after the fact.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// File inside the logs directory that receives the full trace.
pub const RUN_LOG_FILE: &str = "fog-last-run.log";

/// HTTP client internals that drown out request-level events.
const NOISY_TARGETS: &[&str] = &["hyper_util=info", "h2=info", "rustls=info"];

/// Errors raised while installing the subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to create logs directory {path}: {source}")]
    LogsDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}

/// Installs the console and run-file layers.
///
/// Writes to `<logs_dir>/fog-last-run.log` (default `logs/`), truncating the
/// previous run, and returns that path.
///
/// # Errors
///
/// - `TracingError::LogsDir` / `TracingError::LogFile` - Log destination not writable
/// - `TracingError::AlreadyInstalled` - Called twice in one process
pub fn init_tracing(console_level: Level, logs_dir: Option<&Path>) -> Result<PathBuf, TracingError> {
    let logs_dir = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(logs_dir).map_err(|source| TracingError::LogsDir {
        path: logs_dir.to_path_buf(),
        source,
    })?;

    let log_path = logs_dir.join(RUN_LOG_FILE);
    let log_file = File::create(&log_path).map_err(|source| TracingError::LogFile {
        path: log_path.clone(),
        source,
    })?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(console_level)));
    let console_layer = fmt::layer()
        .with_target(true)
        .compact()
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_filter(EnvFilter::new(filter_directives(Level::TRACE)));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        "Tracing initialized: console={}, run log={}",
        console_level,
        log_path.display()
    );
    Ok(log_path)
}

/// Filter directives for `level` with HTTP client internals capped.
pub fn filter_directives(level: Level) -> String {
    std::iter::once(level.to_string().to_lowercase())
        .chain(NOISY_TARGETS.iter().map(|target| target.to_string()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Console verbosity selectable with `--log-level`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl CliLogLevel {
    /// Corresponding `tracing` level.
    ///
    /// # Examples
    /// ```
    /// use fog_core::tracing_setup::CliLogLevel;
    ///
    /// assert_eq!(CliLogLevel::Warn.as_tracing_level(), tracing::Level::WARN);
    /// ```
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::fmt::Display for CliLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = self.as_tracing_level().to_string().to_lowercase();
        f.write_str(&level)
    }
}

#[cfg(test)]
mod tests {
    use clap::ValueEnum;

    use super::*;

    #[test]
    fn test_log_level_names() {
        for (name, level) in [
            ("error", CliLogLevel::Error),
            ("warn", CliLogLevel::Warn),
            ("info", CliLogLevel::Info),
            ("debug", CliLogLevel::Debug),
            ("trace", CliLogLevel::Trace),
        ] {
            assert_eq!(CliLogLevel::from_str(name, true), Ok(level));
            assert_eq!(level.to_string(), name);
        }
        assert!(CliLogLevel::from_str("loud", true).is_err());
        assert_eq!(CliLogLevel::default(), CliLogLevel::Info);
    }

    #[test]
    fn test_filter_directives_cap_client_internals() {
        let directives = filter_directives(Level::DEBUG);
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("hyper_util=info"));
    }
}
