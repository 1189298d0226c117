//! HTTP route composition.
//!
//! The HTTP listener serves one [`HttpRouter`]. It is assembled once at
//! construction by [`compose`]:
//!
//! | Route | Handler |
//! |-------|---------|
//! | `/docs/api.swagger.json` | the descriptor bytes (`GET` only) |
//! | `/docs/*` | documentation assets |
//! | `/*` | the gateway |
//!
//! Without a descriptor the two `/docs` routes are left out and everything
//! goes to the gateway.
//!
//! # Matching
//!
//! Exact routes win over prefix routes, longer prefixes win over shorter
//! ones, and the catch-all applies last. A request matching nothing gets a
//! plain `404`.

use std::sync::Arc;

use bytes::Bytes;
use gantry_core::{response, BoxFuture, HttpHandler, HttpRequest, HttpResponse, SharedHandler};
use gantry_docs::{DocsAssets, DocsService, EmbeddedDocs};
use http::{header, HeaderValue, Method, StatusCode};

/// Path of the API descriptor.
pub const DESCRIPTOR_PATH: &str = "/docs/api.swagger.json";

/// Prefix under which documentation assets are served.
pub const DOCS_PREFIX: &str = "/docs/";

/// Routes requests by path to opaque handlers.
///
/// # Example
///
/// ```rust
/// use gantry_core::{response, HttpRequest};
/// use gantry_server::HttpRouter;
/// use http::StatusCode;
///
/// let mut router = HttpRouter::new();
/// router.route("/healthz", |_req: HttpRequest| async {
///     response::text(StatusCode::OK, "ok")
/// });
/// assert_eq!(router.route_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct HttpRouter {
    exact: Vec<(String, SharedHandler)>,
    prefixes: Vec<(String, SharedHandler)>,
    fallback: Option<SharedHandler>,
}

impl HttpRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler.
    ///
    /// - `"/*"` sets the catch-all
    /// - a path ending in `/*` matches everything below that prefix
    /// - any other path matches exactly
    ///
    /// Registering the same path again replaces the earlier handler.
    pub fn route(&mut self, path: &str, handler: impl HttpHandler) -> &mut Self {
        self.route_shared(path, Arc::new(handler))
    }

    /// Registers an already shared handler. See [`HttpRouter::route`].
    pub fn route_shared(&mut self, path: &str, handler: SharedHandler) -> &mut Self {
        if path == "/*" {
            self.fallback = Some(handler);
        } else if let Some(prefix) = path.strip_suffix('*') {
            upsert(&mut self.prefixes, prefix, handler);
            self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        } else {
            upsert(&mut self.exact, path, handler);
        }
        self
    }

    /// Returns the number of registered routes, counting the catch-all.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.exact.len() + self.prefixes.len() + usize::from(self.fallback.is_some())
    }

    /// Returns true if `path` would be handled by a registered route.
    ///
    /// Route patterns are accepted too: `"/*"` asks whether a catch-all is
    /// set and `"/docs/*"` whether that exact prefix is registered. A plain
    /// path served only by the catch-all reports `false`.
    #[must_use]
    pub fn has_route(&self, path: &str) -> bool {
        if path == "/*" {
            return self.fallback.is_some();
        }
        if let Some(prefix) = path.strip_suffix('*') {
            return self.prefixes.iter().any(|(p, _)| p == prefix);
        }
        self.find(path).is_some()
    }

    fn find(&self, path: &str) -> Option<&SharedHandler> {
        self.exact
            .iter()
            .find(|(p, _)| p == path)
            .or_else(|| self.prefixes.iter().find(|(p, _)| path.starts_with(p.as_str())))
            .map(|(_, h)| h)
    }

    /// Dispatches a request to the matching handler.
    pub fn dispatch(&self, req: HttpRequest) -> BoxFuture<'static, HttpResponse> {
        match self.find(req.uri().path()).or(self.fallback.as_ref()) {
            Some(handler) => handler.call(req),
            None => Box::pin(async { response::status_text(StatusCode::NOT_FOUND) }),
        }
    }
}

impl HttpHandler for HttpRouter {
    fn call(&self, req: HttpRequest) -> BoxFuture<'static, HttpResponse> {
        self.dispatch(req)
    }
}

impl std::fmt::Debug for HttpRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRouter")
            .field("exact", &self.exact.iter().map(|(p, _)| p).collect::<Vec<_>>())
            .field("prefixes", &self.prefixes.iter().map(|(p, _)| p).collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

fn upsert(routes: &mut Vec<(String, SharedHandler)>, path: &str, handler: SharedHandler) {
    if let Some(slot) = routes.iter_mut().find(|(p, _)| p == path) {
        slot.1 = handler;
    } else {
        routes.push((path.to_string(), handler));
    }
}

/// Serves the API descriptor.
///
/// `GET` returns the bytes verbatim as `application/json`. Every other
/// method gets `405` with `Allow: GET`.
#[derive(Debug, Clone)]
pub struct DescriptorHandler {
    descriptor: Bytes,
}

impl DescriptorHandler {
    /// Creates a handler serving `descriptor`.
    #[must_use]
    pub fn new(descriptor: impl Into<Bytes>) -> Self {
        Self {
            descriptor: descriptor.into(),
        }
    }

    /// Builds the response for a method.
    #[must_use]
    pub fn respond(&self, method: &Method) -> HttpResponse {
        if method == Method::GET {
            return response::json_bytes(StatusCode::OK, self.descriptor.clone());
        }

        let mut resp = response::status_text(StatusCode::METHOD_NOT_ALLOWED);
        resp.headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET"));
        resp
    }
}

impl HttpHandler for DescriptorHandler {
    fn call(&self, req: HttpRequest) -> BoxFuture<'static, HttpResponse> {
        let resp = self.respond(req.method());
        Box::pin(async move { resp })
    }
}

/// Builds the HTTP router for a server pair.
///
/// When `descriptor` is `None` no documentation routes are mounted and
/// `docs` is ignored. When `docs` is `None` a Swagger UI page is served.
pub fn compose(
    descriptor: Option<Bytes>,
    docs: Option<Arc<dyn DocsAssets>>,
    gateway: SharedHandler,
) -> HttpRouter {
    let mut router = HttpRouter::new();

    if let Some(descriptor) = descriptor {
        let docs = docs.unwrap_or_else(|| Arc::new(EmbeddedDocs::swagger_ui()));
        router.route(DESCRIPTOR_PATH, DescriptorHandler::new(descriptor));
        router.route(
            &format!("{DOCS_PREFIX}*"),
            DocsService::from_shared(docs).mount(DOCS_PREFIX),
        );
    }

    router.route_shared("/*", gateway);
    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn request(method: Method, path: &str) -> HttpRequest {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::from_static(b"payload"))
            .unwrap()
    }

    async fn body_of(resp: HttpResponse) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    fn echo_gateway() -> SharedHandler {
        Arc::new(|req: HttpRequest| async move {
            let text = format!(
                "gateway {} {} {}",
                req.method(),
                req.uri(),
                String::from_utf8_lossy(req.body())
            );
            response::text(StatusCode::OK, text)
        })
    }

    const DESCRIPTOR: &[u8] = br#"{"swagger":"2.0","info":{"title":"t"}}"#;

    #[tokio::test]
    async fn test_descriptor_get() {
        let router = compose(Some(Bytes::from_static(DESCRIPTOR)), None, echo_gateway());
        let resp = router.dispatch(request(Method::GET, DESCRIPTOR_PATH)).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(&body_of(resp).await[..], DESCRIPTOR);
    }

    #[tokio::test]
    async fn test_descriptor_other_methods() {
        let router = compose(Some(Bytes::from_static(DESCRIPTOR)), None, echo_gateway());

        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let resp = router.dispatch(request(method.clone(), DESCRIPTOR_PATH)).await;
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert_eq!(resp.headers().get(header::ALLOW).unwrap(), "GET");
        }
    }

    #[tokio::test]
    async fn test_docs_default_swagger_ui() {
        let router = compose(Some(Bytes::from_static(DESCRIPTOR)), None, echo_gateway());

        for path in ["/docs/", "/docs/index.html"] {
            let resp = router.dispatch(request(Method::GET, path)).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body = body_of(resp).await;
            assert!(String::from_utf8_lossy(&body).contains("./api.swagger.json"));
        }
    }

    #[tokio::test]
    async fn test_docs_custom_assets() {
        let docs: Arc<dyn DocsAssets> =
            Arc::new(EmbeddedDocs::new().with_asset("guide.md", "# Guide"));
        let router = compose(Some(Bytes::from_static(DESCRIPTOR)), Some(docs), echo_gateway());

        let resp = router.dispatch(request(Method::GET, "/docs/guide.md")).await;
        assert_eq!(body_of(resp).await, "# Guide");

        let resp = router.dispatch(request(Method::GET, "/docs/missing.md")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_catch_all_forwards_unmodified() {
        let router = compose(Some(Bytes::from_static(DESCRIPTOR)), None, echo_gateway());
        let resp = router
            .dispatch(request(Method::PATCH, "/v1/users/7?fields=name"))
            .await;

        assert_eq!(
            body_of(resp).await,
            "gateway PATCH /v1/users/7?fields=name payload"
        );
    }

    #[tokio::test]
    async fn test_no_descriptor_omits_docs() {
        let router = compose(None, Some(Arc::new(EmbeddedDocs::swagger_ui())), echo_gateway());
        assert_eq!(router.route_count(), 1);

        for path in [DESCRIPTOR_PATH, "/docs/", "/docs/index.html"] {
            let resp = router.dispatch(request(Method::GET, path)).await;
            let body = body_of(resp).await;
            assert!(body.starts_with(b"gateway GET /docs"), "{path}");
        }
    }

    #[tokio::test]
    async fn test_docs_without_trailing_slash_goes_to_gateway() {
        let router = compose(Some(Bytes::from_static(DESCRIPTOR)), None, echo_gateway());
        let resp = router.dispatch(request(Method::GET, "/docs")).await;
        assert!(body_of(resp).await.starts_with(b"gateway"));
    }

    #[tokio::test]
    async fn test_additional_routes() {
        let mut router = compose(None, None, echo_gateway());
        router.route("/healthz", |_req: HttpRequest| async {
            response::text(StatusCode::OK, "ok")
        });
        router.route("/static/*", |_req: HttpRequest| async {
            response::text(StatusCode::OK, "short")
        });
        router.route("/static/img/*", |_req: HttpRequest| async {
            response::text(StatusCode::OK, "long")
        });

        let resp = router.dispatch(request(Method::GET, "/healthz")).await;
        assert_eq!(body_of(resp).await, "ok");

        let resp = router.dispatch(request(Method::GET, "/static/img/a.png")).await;
        assert_eq!(body_of(resp).await, "long");

        let resp = router.dispatch(request(Method::GET, "/static/app.js")).await;
        assert_eq!(body_of(resp).await, "short");

        assert!(router.has_route("/healthz"));
        assert!(!router.has_route("/v1/other"));
    }

    #[tokio::test]
    async fn test_no_fallback_is_not_found() {
        let router = HttpRouter::new();
        let resp = router.dispatch(request(Method::GET, "/anything")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_route_replaces_same_path() {
        let mut router = HttpRouter::new();
        router.route("/a", |_req: HttpRequest| async { response::empty(StatusCode::OK) });
        router.route("/a", |_req: HttpRequest| async {
            response::empty(StatusCode::ACCEPTED)
        });
        assert_eq!(router.route_count(), 1);
    }
}
