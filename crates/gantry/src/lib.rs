//! # Gantry
//!
//! A gRPC server and a JSON/HTTP gateway on two ports, started together and
//! shut down in order: RPC first, then HTTP, within one deadline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gantry::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_optional_file("gantry.toml")?
//!         .with_env_prefix("GANTRY")
//!         .load()?;
//!
//!     let _log = init_logging(&gantry::bootstrap::log_config(&config))?;
//!     let app = App::new(gantry::bootstrap::server_config(&config)?);
//!
//!     app.start().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Crates
//!
//! - [`server`] - configuration, listeners, lifecycle and the server pair
//! - [`gateway`] - the JSON/HTTP to RPC multiplexer
//! - [`docs`] - documentation assets and the Swagger UI page
//! - [`telemetry`] - logging setup with a runtime-adjustable level
//! - [`config`] - layered file and environment configuration
//! - [`db`] - PostgreSQL pool and transactions

#![doc(html_root_url = "https://docs.rs/gantry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bootstrap;

pub use gantry_config as config;
pub use gantry_core as core;
pub use gantry_db as db;
pub use gantry_docs as docs;
pub use gantry_gateway as gateway;
pub use gantry_server as server;
pub use gantry_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use gantry::prelude::*;
/// ```
pub mod prelude {
    pub use gantry_config::{ConfigError, ConfigLoader, GantryConfig};
    pub use gantry_core::{response, HttpHandler, HttpRequest, HttpResponse};
    pub use gantry_db::{Database, DbOptions, TxError};
    pub use gantry_gateway::{GatewayMux, PathParams};
    pub use gantry_server::{
        App, FatalPolicy, Readiness, RpcDrain, ServerConfig, ServerError, ShutdownCause,
        ShutdownSignal,
    };
    pub use gantry_telemetry::{init_logging, LogConfig, LogHandle};

    pub use crate::bootstrap::BootstrapError;
}
