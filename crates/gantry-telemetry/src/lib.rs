//! Structured logging for Gantry.
//!
//! Gantry logs through the `tracing` macros. This crate installs the
//! subscriber that turns those events into records:
//!
//! - JSON lines on stderr by default, or a human-readable pretty format
//! - a verbosity level that can be changed while the process is running
//!
//! # Example
//!
//! ```rust,ignore
//! use gantry_telemetry::{init_logging, LogConfig};
//! use tracing::level_filters::LevelFilter;
//!
//! let handle = init_logging(&LogConfig::production())?;
//! tracing::info!(listener = "http", addr = "0.0.0.0:8080", "listening");
//!
//! // Turn up verbosity later, for example from an admin RPC.
//! handle.set_level(LevelFilter::DEBUG)?;
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{init_logging, parse_level, LogConfig, LogHandle};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
