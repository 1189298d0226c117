//! The HTTP handler abstraction.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;

/// Type alias for a boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An HTTP request with its body collected into memory.
pub type HttpRequest = Request<Bytes>;

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

/// A type-erased, shareable handler.
pub type SharedHandler = Arc<dyn HttpHandler>;

/// An asynchronous request handler.
///
/// Handlers never fail: every error condition must already be expressed as
/// an HTTP response. This mirrors how the router composer treats mounted
/// handlers as opaque.
///
/// Any `Fn(HttpRequest) -> impl Future<Output = HttpResponse>` closure is a
/// handler.
pub trait HttpHandler: Send + Sync + 'static {
    /// Handles one request.
    fn call(&self, req: HttpRequest) -> BoxFuture<'static, HttpResponse>;
}

impl<F, Fut> HttpHandler for F
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HttpResponse> + Send + 'static,
{
    fn call(&self, req: HttpRequest) -> BoxFuture<'static, HttpResponse> {
        Box::pin(self(req))
    }
}
