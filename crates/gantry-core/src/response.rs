//! Response construction helpers.
//!
//! `Response::builder()` only fails on invalid header values. The helpers
//! below only set well-known static headers, so the fallback branches exist
//! to avoid panicking rather than as an expected path.

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;

use crate::HttpResponse;

/// Content type used for JSON bodies.
pub const APPLICATION_JSON: &str = "application/json";

/// Content type used for plain-text bodies.
pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Builds a response with the given status, content type and body.
pub fn with_body(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> HttpResponse {
    let body = body.into();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Full::new(body.clone()))
        .unwrap_or_else(|_| Response::new(Full::new(body)))
}

/// Builds a JSON response from raw, already-encoded bytes.
pub fn json_bytes(status: StatusCode, body: impl Into<Bytes>) -> HttpResponse {
    with_body(status, APPLICATION_JSON, body)
}

/// Serializes `value` as the JSON body of a response.
///
/// Serialization failures produce a `500` with an empty JSON object.
pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> HttpResponse {
    match serde_json::to_vec(value) {
        Ok(body) => json_bytes(status, body),
        Err(_) => json_bytes(StatusCode::INTERNAL_SERVER_ERROR, "{}"),
    }
}

/// Builds a plain-text response.
pub fn text(status: StatusCode, body: impl Into<String>) -> HttpResponse {
    with_body(status, TEXT_PLAIN, body.into())
}

/// Builds a response without a body.
pub fn empty(status: StatusCode) -> HttpResponse {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// Builds a plain-text error whose body is the canonical reason phrase.
///
/// The body ends with a newline, matching common HTTP server error pages.
pub fn status_text(status: StatusCode) -> HttpResponse {
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    text(status, format!("{reason}\n"))
}
