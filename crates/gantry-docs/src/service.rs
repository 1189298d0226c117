//! HTTP semantics for documentation assets.
//!
//! [`DocsService`] turns a [`DocsAssets`] provider into an HTTP handler:
//!
//! - `GET` and `HEAD` only, anything else is `405`
//! - `index.html` for the mount root and for paths ending in `/`
//! - `Content-Type` from the file extension
//! - `ETag` / `If-None-Match` and `Last-Modified` / `If-Modified-Since`

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use gantry_core::{response, BoxFuture, HttpHandler, HttpRequest, HttpResponse};
use http::{header, HeaderMap, Method, Response, StatusCode};

use crate::assets::{DocAsset, DocsAssets, INDEX_FILE};
use crate::error::{DocsError, DocsResult};

/// Serves documentation assets mounted under a path prefix.
///
/// # Example
///
/// ```rust
/// use gantry_docs::{DocsService, EmbeddedDocs};
/// use http::{HeaderMap, Method, StatusCode};
///
/// let service = DocsService::new(EmbeddedDocs::swagger_ui());
/// let resp = service.respond(&Method::GET, "/docs/", &HeaderMap::new());
/// assert_eq!(resp.status(), StatusCode::OK);
/// ```
#[derive(Debug, Clone)]
pub struct DocsService {
    assets: Arc<dyn DocsAssets>,
    mount: String,
    cache_control: Option<String>,
}

impl DocsService {
    /// Creates a service mounted at `/docs/`.
    #[must_use]
    pub fn new(assets: impl DocsAssets) -> Self {
        Self::from_shared(Arc::new(assets))
    }

    /// Creates a service from an already shared provider.
    #[must_use]
    pub fn from_shared(assets: Arc<dyn DocsAssets>) -> Self {
        Self {
            assets,
            mount: "/docs/".to_string(),
            cache_control: None,
        }
    }

    /// Sets the mount prefix. A trailing `/` is added if missing.
    #[must_use]
    pub fn mount(mut self, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        self.mount = prefix;
        self
    }

    /// Sets the Cache-Control header value for responses.
    #[must_use]
    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    /// Returns the mount prefix.
    #[must_use]
    pub fn mount_prefix(&self) -> &str {
        &self.mount
    }

    /// Serves `path`, converting every error into a response.
    pub fn respond(&self, method: &Method, path: &str, headers: &HeaderMap) -> HttpResponse {
        let Some(relative) = path.strip_prefix(&self.mount) else {
            return response::status_text(StatusCode::NOT_FOUND);
        };

        match self.handle(method, relative, headers) {
            Ok(resp) => resp,
            Err(err) => {
                if let DocsError::Io(ref e) = err {
                    tracing::warn!(path = %path, error = %e, "failed to read documentation asset");
                }
                let mut resp = response::status_text(err.status_code());
                if matches!(err, DocsError::MethodNotAllowed) {
                    resp.headers_mut()
                        .insert(header::ALLOW, header::HeaderValue::from_static("GET, HEAD"));
                }
                resp
            }
        }
    }

    /// Serves an asset by its path relative to the mount prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The method is not GET or HEAD
    /// - The provider rejects the path
    /// - No asset exists at the path
    pub fn handle(
        &self,
        method: &Method,
        relative_path: &str,
        headers: &HeaderMap,
    ) -> DocsResult<HttpResponse> {
        if method != Method::GET && method != Method::HEAD {
            return Err(DocsError::MethodNotAllowed);
        }

        let path = if relative_path.is_empty() || relative_path.ends_with('/') {
            format!("{relative_path}{INDEX_FILE}")
        } else {
            relative_path.to_string()
        };

        let asset = self
            .assets
            .get(&path)?
            .ok_or_else(|| DocsError::NotFound(path.clone()))?;

        let etag = generate_etag(&asset);

        if let Some(value) = headers
            .get(header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
        {
            if value.split(',').any(|tag| {
                let tag = tag.trim();
                tag == etag || tag == "*"
            }) {
                return Ok(self.not_modified_response(&etag));
            }
        } else if is_not_modified_since(asset.modified, headers) {
            return Ok(self.not_modified_response(&etag));
        }

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, detect_mime_type(&path))
            .header(header::CONTENT_LENGTH, asset.bytes.len().to_string())
            .header(header::ETAG, etag.as_str());

        if let Some(modified) = asset.modified {
            builder = builder.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
        }
        if let Some(ref cache_control) = self.cache_control {
            builder = builder.header(header::CACHE_CONTROL, cache_control.as_str());
        }

        let body = if method == Method::HEAD {
            Bytes::new()
        } else {
            asset.bytes
        };

        builder
            .body(http_body_util::Full::new(body))
            .map_err(|e| DocsError::Io(std::io::Error::other(e.to_string())))
    }

    /// Builds a 304 Not Modified response.
    fn not_modified_response(&self, etag: &str) -> HttpResponse {
        let mut resp = response::empty(StatusCode::NOT_MODIFIED);
        if let Ok(value) = header::HeaderValue::from_str(etag) {
            resp.headers_mut().insert(header::ETAG, value);
        }
        if let Some(value) = self
            .cache_control
            .as_deref()
            .and_then(|v| header::HeaderValue::from_str(v).ok())
        {
            resp.headers_mut().insert(header::CACHE_CONTROL, value);
        }
        resp
    }
}

impl HttpHandler for DocsService {
    fn call(&self, req: HttpRequest) -> BoxFuture<'static, HttpResponse> {
        let resp = self.respond(req.method(), req.uri().path(), req.headers());
        Box::pin(async move { resp })
    }
}

/// Generates a strong `ETag` from the asset contents.
fn generate_etag(asset: &DocAsset) -> String {
    let mut hasher = DefaultHasher::new();
    asset.bytes.hash(&mut hasher);
    format!("\"{:x}-{:016x}\"", asset.bytes.len(), hasher.finish())
}

/// Evaluates `If-Modified-Since` at one-second resolution.
fn is_not_modified_since(modified: Option<SystemTime>, headers: &HeaderMap) -> bool {
    let Some(modified) = modified else {
        return false;
    };
    let Some(since) = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok())
    else {
        return false;
    };

    match (
        modified.duration_since(SystemTime::UNIX_EPOCH),
        since.duration_since(SystemTime::UNIX_EPOCH),
    ) {
        (Ok(modified), Ok(since)) => modified.as_secs() <= since.as_secs(),
        _ => false,
    }
}

/// Detects the MIME type for a path from its extension.
#[must_use]
pub fn detect_mime_type(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        // Text
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "txt" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",

        _ => "application/octet-stream",
    }
}
