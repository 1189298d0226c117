//! Configuration types.
//!
//! [`GantryConfig`] is the root; each section has its own struct with serde
//! defaults so a partial file only needs the keys it changes.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Complete Gantry configuration.
///
/// # Example
///
/// ```
/// use gantry_config::GantryConfig;
///
/// let config = GantryConfig::default();
/// assert_eq!(config.server.http_port, 8080);
/// assert_eq!(config.server.rpc_port, 9000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct GantryConfig {
    /// Listener and shutdown settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseSection,
}

impl GantryConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - both ports are equal and non-zero
    /// - `server.bind_host` is not an IP address
    /// - `server.shutdown_timeout_secs` is zero
    /// - `logging.level` is not a known level
    /// - the database pool bounds are inconsistent
    ///
    /// # Example
    ///
    /// ```
    /// use gantry_config::GantryConfig;
    ///
    /// let mut config = GantryConfig::default();
    /// config.server.rpc_port = config.server.http_port;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.http_port != 0 && server.http_port == server.rpc_port {
            return Err(ConfigError::invalid_value(
                "server.rpc_port",
                format!("must differ from server.http_port ({})", server.http_port),
            ));
        }

        if server.bind_host.parse::<IpAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.bind_host",
                format!("invalid IP address: {}", server.bind_host),
            ));
        }

        if server.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.shutdown_timeout_secs",
                "must be greater than zero",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown level '{}'", self.logging.level),
            ));
        }

        let database = &self.database;
        if database.max_connections == 0 {
            return Err(ConfigError::invalid_value(
                "database.max_connections",
                "must be greater than zero",
            ));
        }
        if database.min_connections > database.max_connections {
            return Err(ConfigError::invalid_value(
                "database.min_connections",
                "must not exceed database.max_connections",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs with colors.
    ///
    /// # Example
    ///
    /// ```
    /// use gantry_config::{GantryConfig, LogFormat};
    ///
    /// let config = GantryConfig::development();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ansi: true,
                ..LoggingSection::default()
            },
            ..Self::default()
        }
    }

    /// Production preset: JSON logs at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

/// The `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// HTTP gateway port. `0` lets the OS pick.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// gRPC port. `0` lets the OS pick.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Address both listeners bind to.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,

    /// Graceful shutdown deadline in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Whether the RPC drain shares the shutdown deadline.
    #[serde(default = "default_true")]
    pub bounded_rpc_drain: bool,

    /// Path to the API descriptor served at `/docs/api.swagger.json`.
    #[serde(default)]
    pub descriptor_path: Option<String>,

    /// Directory of documentation assets served under `/docs/`.
    ///
    /// Without it the built-in Swagger UI page is used.
    #[serde(default)]
    pub docs_dir: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            rpc_port: default_rpc_port(),
            bind_host: default_bind_host(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            bounded_rpc_drain: true,
            descriptor_path: None,
            docs_dir: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

/// The `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Initial level: trace, debug, info, warn, error or off.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Colored output (pretty format only).
    #[serde(default)]
    pub ansi: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            ansi: false,
        }
    }
}

/// The `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseSection {
    /// PostgreSQL connection string. No pool is created when unset.
    #[serde(default)]
    pub url: Option<String>,

    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connections kept open when idle.
    #[serde(default)]
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: 0,
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

fn default_rpc_port() -> u16 {
    9000
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}
