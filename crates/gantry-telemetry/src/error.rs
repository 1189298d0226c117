//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while setting up or adjusting logging.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to install the global subscriber.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The level string is not a recognised verbosity.
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// The running subscriber rejected a level change.
    #[error("Failed to reload log level: {0}")]
    Reload(String),
}
