//! # Gantry Gateway
//!
//! The default gateway multiplexer: it exposes RPC-backed operations as
//! JSON over HTTP.
//!
//! Handlers are registered per method and path template. Typed handlers
//! receive the JSON body merged with the path parameters and answer with a
//! value or a [`tonic::Status`]. Failures are rendered as
//! `{"code", "message", "details"}` JSON with the HTTP status conventionally
//! associated with the RPC code.
//!
//! ```rust
//! use gantry_gateway::{GatewayMux, http_status};
//! use http::{Method, StatusCode};
//!
//! let mux = GatewayMux::new();
//! mux.handle_json(Method::POST, "/v1/echo", |body: serde_json::Value| async move {
//!     Ok::<_, tonic::Status>(body)
//! })
//! .unwrap();
//!
//! assert_eq!(http_status(tonic::Code::NotFound), StatusCode::NOT_FOUND);
//! ```

#![warn(missing_docs)]

mod error;
mod mux;
mod pattern;
mod status;

pub use error::{GatewayError, GatewayResult};
pub use mux::{GatewayMux, PathHandler};
pub use pattern::{PathParams, PathPattern};
pub use status::{http_status, status_response, ErrorBody};
