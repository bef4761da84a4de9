//! # Logging & Tracing Infrastructure
//!
//! Configures the `tracing-subscriber` stack used by every core crate:
//! env-filter based module filtering plus a pretty or compact output format.
//!
//! ## Usage
//!
//! ```no_run
//! use core_runtime::logging::{init_logging, LoggingConfig, LogFormat};
//!
//! init_logging(LoggingConfig::default().with_format(LogFormat::Compact))
//!     .expect("failed to initialize logging");
//! tracing::info!("core started");
//! ```
//!
//! The filter honors `RUST_LOG` when set; otherwise the configured default
//! level applies to all modules. `init_logging` may only succeed once per
//! process; later calls return an error instead of panicking so tests can
//! race it safely.

use crate::error::{Error, Result};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors.
    Pretty,
    /// Compact single-line format for production.
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Compact;
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Default level directive when `RUST_LOG` is unset (e.g. `"info"`).
    pub default_level: String,
    /// Extra filter directives (e.g. `"core_playback=debug"`).
    pub filter: Option<String>,
    /// Display the target module in log lines.
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            default_level: "info".to_string(),
            filter: None,
            display_target: true,
        }
    }
}

impl LoggingConfig {
    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the default level directive.
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    /// Set extra filter directives.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error when a global subscriber is already installed or the
/// filter directives fail to parse.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let mut filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .map_err(|e| Error::Config(format!("invalid log level directive: {e}")))?;

    if let Some(directives) = &config.filter {
        for directive in directives.split(',').filter(|d| !d.is_empty()) {
            filter = filter.add_directive(
                directive
                    .parse()
                    .map_err(|e| Error::Config(format!("invalid filter directive: {e}")))?,
            );
        }
    }

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(config.display_target),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(config.display_target),
            )
            .try_init(),
    };

    result.map_err(|e| Error::Config(format!("failed to install subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_config_setters() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_default_level("debug")
            .with_filter("core_playback=trace");

        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.default_level, "debug");
        assert_eq!(config.filter.as_deref(), Some("core_playback=trace"));
    }

    #[test]
    fn init_is_not_reentrant() {
        // Whichever call lands second must fail cleanly rather than panic.
        let first = init_logging(LoggingConfig::default());
        let second = init_logging(LoggingConfig::default());
        assert!(first.is_ok() || second.is_err());
    }
}
