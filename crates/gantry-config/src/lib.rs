//! Layered configuration for Gantry.
//!
//! This crate provides a strongly-typed configuration with support for:
//! - TOML and JSON configuration files
//! - `.env` files
//! - Environment variable overrides (`GANTRY__SERVER__HTTP_PORT=8081`)
//! - Strict parsing (fails on unknown fields) and validation
//!
//! # Example
//!
//! ```no_run
//! use gantry_config::ConfigLoader;
//!
//! # fn main() -> Result<(), gantry_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("gantry.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("GANTRY")
//!     .load()?;
//!
//! println!("gateway on {}, rpc on {}", config.server.http_port, config.server.rpc_port);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_port = 8080
//! rpc_port = 9000
//! bind_host = "0.0.0.0"
//! shutdown_timeout_secs = 10
//! bounded_rpc_drain = true
//! descriptor_path = "api.swagger.json"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [database]
//! url = "postgres://localhost/app"
//! max_connections = 10
//! ```

#![doc(html_root_url = "https://docs.rs/gantry-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;

pub use config::{
    DatabaseSection, GantryConfig, LogFormat, LoggingSection, ServerSection, LOG_LEVELS,
};
pub use error::ConfigError;
pub use loader::ConfigLoader;
