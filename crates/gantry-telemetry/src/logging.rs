//! Structured JSON logging with a reloadable level.
//!
//! The subscriber is a `tracing_subscriber` registry with two layers: a
//! [`reload`](tracing_subscriber::reload) wrapped [`LevelFilter`] and a
//! formatting layer writing to stderr. The reload handle is returned to the
//! caller as a [`LogHandle`].
//!
//! # Example
//!
//! ```rust,ignore
//! use gantry_telemetry::logging::{LogConfig, init_logging};
//!
//! let handle = init_logging(&LogConfig::default())?;
//! assert_eq!(handle.level(), tracing::level_filters::LevelFilter::INFO);
//! ```

use std::fmt;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Log level (`trace`, `debug`, `info`, `warn`, `error` or `off`).
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include thread IDs.
    pub thread_ids: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Whether the pretty formatter may emit ANSI colours.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            ansi: false,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            file_line_info: true,
            thread_ids: false,
            include_target: true,
            ansi: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

/// Handle to the running subscriber's level filter.
///
/// Cloning is cheap; all clones control the same filter. A handle returned
/// while logging is disabled is detached: it reports [`LevelFilter::OFF`] and
/// accepts level changes without effect.
#[derive(Clone)]
pub struct LogHandle {
    inner: Option<reload::Handle<LevelFilter, Registry>>,
}

impl LogHandle {
    /// Creates a handle that is not attached to any subscriber.
    #[must_use]
    pub fn detached() -> Self {
        Self { inner: None }
    }

    /// Returns whether the handle controls an installed subscriber.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.is_some()
    }

    /// Changes the active log level.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::Reload` if the subscriber has been dropped.
    pub fn set_level(&self, level: LevelFilter) -> TelemetryResult<()> {
        let Some(handle) = &self.inner else {
            return Ok(());
        };
        handle
            .modify(|filter| *filter = level)
            .map_err(|e| TelemetryError::Reload(e.to_string()))?;
        tracing::debug!(level = %level, "log level changed");
        Ok(())
    }

    /// Returns the active log level.
    #[must_use]
    pub fn level(&self) -> LevelFilter {
        self.inner
            .as_ref()
            .and_then(reload::Handle::clone_current)
            .unwrap_or(LevelFilter::OFF)
    }
}

impl fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHandle")
            .field("attached", &self.is_attached())
            .field("level", &self.level())
            .finish()
    }
}

/// Parses a level name into a [`LevelFilter`].
///
/// Matching is case-insensitive.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidLevel` for unknown names.
pub fn parse_level(level: &str) -> TelemetryResult<LevelFilter> {
    level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| TelemetryError::InvalidLevel(level.to_string()))
}

/// Initializes the logging subsystem.
///
/// Installs the global subscriber and returns the handle used to adjust the
/// level afterwards. When `config.enabled` is false nothing is installed and
/// a detached handle is returned.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidLevel` if `config.level` does not parse,
/// or `TelemetryError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<LogHandle> {
    if !config.enabled {
        return Ok(LogHandle::detached());
    }

    let level = parse_level(&config.level)?;
    let (filter, handle) = reload::Layer::new(level);

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_ansi(config.ansi)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_thread_ids(config.thread_ids)
            .with_target(config.include_target);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(LogHandle {
        inner: Some(handle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert!(config.json_format);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_production_config() {
        let config = LogConfig::production();
        assert!(config.json_format);
        assert!(!config.file_line_info);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level(" warn ").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
        assert!(matches!(
            parse_level("chatty"),
            Err(TelemetryError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..Default::default()
        };

        let handle = init_logging(&config).unwrap();
        assert!(!handle.is_attached());
        assert_eq!(handle.level(), LevelFilter::OFF);
        assert!(handle.set_level(LevelFilter::DEBUG).is_ok());
    }

    #[test]
    fn test_invalid_level_rejected_before_install() {
        let config = LogConfig {
            level: "verbose".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::InvalidLevel(_))
        ));
    }

    // The only test in this crate that installs the global subscriber.
    #[test]
    fn test_runtime_level_change() {
        let handle = init_logging(&LogConfig::production()).unwrap();
        assert!(handle.is_attached());
        assert_eq!(handle.level(), LevelFilter::INFO);

        handle.set_level(LevelFilter::DEBUG).unwrap();
        assert_eq!(handle.level(), LevelFilter::DEBUG);

        let clone = handle.clone();
        clone.set_level(LevelFilter::ERROR).unwrap();
        assert_eq!(handle.level(), LevelFilter::ERROR);
    }
}
