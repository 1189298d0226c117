//! # Gantry Core
//!
//! Shared HTTP types for the Gantry dual-protocol server.
//!
//! Every component that sits on the HTTP side of Gantry (the router composer,
//! the gateway multiplexer and the documentation service) speaks the same
//! small vocabulary defined here:
//!
//! - [`HttpRequest`] - a request whose body has already been collected
//! - [`HttpResponse`] - a response with a fully buffered body
//! - [`HttpHandler`] - anything that turns one into the other asynchronously
//!
//! Plain async closures implement [`HttpHandler`] directly:
//!
//! ```rust
//! use gantry_core::{response, HttpHandler, HttpRequest};
//! use http::StatusCode;
//!
//! let handler = |_req: HttpRequest| async { response::text(StatusCode::OK, "pong") };
//! let _shared: gantry_core::SharedHandler = std::sync::Arc::new(handler);
//! ```

#![doc(html_root_url = "https://docs.rs/gantry-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod handler;
pub mod response;

pub use handler::{BoxFuture, HttpHandler, HttpRequest, HttpResponse, ResponseBody, SharedHandler};
