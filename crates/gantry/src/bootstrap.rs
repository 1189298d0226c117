//! Turns a loaded [`GantryConfig`] into the settings each crate consumes.

use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use gantry_config::{DatabaseSection, GantryConfig, LogFormat};
use gantry_db::{Database, DbError, DbOptions};
use gantry_docs::DirectoryDocs;
use gantry_server::{RpcDrain, ServerConfig, ServerError};
use gantry_telemetry::LogConfig;
use thiserror::Error;

/// Errors raised while bridging configuration into server settings.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// `server.bind_host` is not an IP address.
    #[error("invalid bind host: {0}")]
    InvalidBindHost(String),

    /// The descriptor file could not be read.
    #[error("failed to read API descriptor {path}")]
    Descriptor {
        /// The configured path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The resulting server configuration was rejected.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Builds the server configuration.
///
/// Reads `server.descriptor_path` from disk when set and serves
/// `server.docs_dir` in place of the built-in Swagger UI page.
///
/// # Errors
///
/// Returns `BootstrapError` if the bind host does not parse, the descriptor
/// cannot be read, or the ports collide.
///
/// # Example
///
/// ```
/// use gantry::config::GantryConfig;
///
/// let mut config = GantryConfig::default();
/// config.server.http_port = 8081;
/// config.server.rpc_port = 9001;
///
/// let server = gantry::bootstrap::server_config(&config).unwrap();
/// assert_eq!(server.http_port(), 8081);
/// assert_eq!(server.rpc_port(), 9001);
/// ```
pub fn server_config(config: &GantryConfig) -> Result<ServerConfig, BootstrapError> {
    let server = &config.server;

    let bind_host: IpAddr = server
        .bind_host
        .parse()
        .map_err(|_| BootstrapError::InvalidBindHost(server.bind_host.clone()))?;

    let rpc_drain = if server.bounded_rpc_drain {
        RpcDrain::Bounded
    } else {
        RpcDrain::Unbounded
    };

    let mut builder = ServerConfig::builder()
        .rpc_port(server.rpc_port)
        .http_port(server.http_port)
        .bind_host(bind_host)
        .shutdown_timeout(Duration::from_secs(server.shutdown_timeout_secs))
        .rpc_drain(rpc_drain);

    if let Some(path) = &server.descriptor_path {
        let descriptor = fs::read(path).map_err(|source| BootstrapError::Descriptor {
            path: PathBuf::from(path),
            source,
        })?;
        tracing::debug!(path = %path, bytes = descriptor.len(), "loaded API descriptor");
        builder = builder.descriptor(descriptor);
    }

    if let Some(dir) = &server.docs_dir {
        builder = builder.docs(DirectoryDocs::new(dir));
    }

    Ok(builder.build()?)
}

/// Builds the logging configuration.
///
/// # Example
///
/// ```
/// use gantry::config::GantryConfig;
///
/// let log = gantry::bootstrap::log_config(&GantryConfig::development());
/// assert_eq!(log.level, "debug");
/// assert!(!log.json_format);
/// ```
pub fn log_config(config: &GantryConfig) -> LogConfig {
    let logging = &config.logging;
    LogConfig {
        enabled: logging.enabled,
        level: logging.level.to_lowercase(),
        json_format: logging.format == LogFormat::Json,
        ansi: logging.ansi,
        ..LogConfig::default()
    }
}

/// Builds pool options from the `[database]` section.
pub fn db_options(section: &DatabaseSection) -> DbOptions {
    DbOptions {
        max_connections: section.max_connections,
        min_connections: section.min_connections,
        acquire_timeout: Duration::from_secs(section.acquire_timeout_secs),
    }
}

/// Connects to the configured database, if `database.url` is set.
///
/// # Errors
///
/// Returns `DbError::Connect` if the pool cannot connect.
pub async fn connect_database(config: &GantryConfig) -> Result<Option<Database>, DbError> {
    match &config.database.url {
        Some(url) => Database::connect_with(url, db_options(&config.database))
            .await
            .map(Some),
        None => Ok(None),
    }
}
