//! # Gantry Server
//!
//! A gRPC server and an HTTP gateway server running side by side, with one
//! ordered and time-bounded graceful shutdown.
//!
//! This crate provides:
//!
//! - [`ServerConfig`] - validated ports, descriptor, docs and shutdown policy
//! - [`App`] - the server pair with accessors for service and route registration
//! - [`HttpRouter`] and [`compose`] - the documentation and catch-all routes
//! - [`ShutdownSignal`] - programmatic and OS-signal shutdown
//! - [`Readiness`] - bound addresses or bind failures per listener
//! - [`LifecycleEvents`] - an injectable sink for lifecycle reporting
//!
//! ## Example
//!
//! ```rust,no_run
//! use gantry_server::{App, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder()
//!         .rpc_port(9000)
//!         .http_port(8080)
//!         .descriptor(std::fs::read("api.swagger.json")?)
//!         .build()?;
//!
//!     let app = App::new(config);
//!     app.gateway().handle_path(http::Method::GET, "/v1/ping", |_req, _params| async {
//!         gantry_core::response::text(http::StatusCode::OK, "pong")
//!     })?;
//!
//!     // Returns after SIGINT/SIGTERM once both servers have stopped.
//!     app.start().await;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/gantry-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
pub mod config;
mod error;
pub mod events;
mod http_server;
mod lifecycle;
mod readiness;
mod router;
mod rpc_server;
pub mod shutdown;

pub use app::App;
pub use config::{FatalPolicy, RpcDrain, ServerConfig, ServerConfigBuilder};
pub use error::ServerError;
pub use events::{
    LifecycleEvent, LifecycleEvents, LifecycleState, ListenerKind, RecordingEvents, TracingEvents,
};
pub use http_server::HttpServer;
pub use readiness::{ListenerStatus, Readiness, ReadinessError, ReadyReporter};
pub use router::{compose, DescriptorHandler, HttpRouter, DESCRIPTOR_PATH, DOCS_PREFIX};
pub use rpc_server::RpcServer;
pub use shutdown::{ShutdownCause, ShutdownSignal};
