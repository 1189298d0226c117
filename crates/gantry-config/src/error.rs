//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`GantryConfig`](crate::GantryConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required file does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The configured path.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// The configured path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML layer is malformed.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error, including unknown fields in either format.
    #[error("failed to parse configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The configuration format is neither TOML nor JSON.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the field, e.g. `server.rpc_port`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `PREFIX__SECTION__KEY` variable has an unparseable value.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// The `.env` file exists but could not be loaded.
    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::FileNotFound`].
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Shorthand for [`ConfigError::ReadError`].
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ConfigError::EnvParseError`].
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
