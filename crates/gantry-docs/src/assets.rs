//! Documentation asset providers.
//!
//! The server never reads documentation files itself. It asks a
//! [`DocsAssets`] provider for a path relative to the documentation prefix
//! and serves whatever comes back.
//!
//! # Security
//!
//! [`DirectoryDocs`] rejects:
//!
//! - `..` components
//! - hidden files (names starting with `.`)
//! - paths whose canonical form escapes the root directory

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;

use crate::error::{DocsError, DocsResult};
use crate::swagger::SwaggerUi;

/// File served for directory requests.
pub const INDEX_FILE: &str = "index.html";

/// A documentation asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocAsset {
    /// Asset contents.
    pub bytes: Bytes,
    /// Modification time, if the provider tracks one.
    pub modified: Option<SystemTime>,
}

impl DocAsset {
    /// Creates an asset without a modification time.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            modified: None,
        }
    }

    /// Sets the modification time.
    #[must_use]
    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }
}

/// A read-only set of documentation assets.
///
/// `path` is relative to the documentation prefix and never starts with `/`.
/// Providers return `Ok(None)` for paths they do not have.
pub trait DocsAssets: fmt::Debug + Send + Sync + 'static {
    /// Looks up one asset.
    fn get(&self, path: &str) -> DocsResult<Option<DocAsset>>;
}

/// Assets held in memory.
///
/// # Example
///
/// ```rust
/// use gantry_docs::{DocsAssets, EmbeddedDocs};
///
/// let docs = EmbeddedDocs::new()
///     .with_asset("index.html", "<h1>API</h1>")
///     .with_asset("/css/site.css", "h1 { color: red }");
///
/// assert!(docs.get("css/site.css").unwrap().is_some());
/// assert!(docs.get("missing.js").unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmbeddedDocs {
    assets: HashMap<String, DocAsset>,
}

impl EmbeddedDocs {
    /// Creates an empty asset set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the default asset set: a Swagger UI index page that loads
    /// `./api.swagger.json`.
    #[must_use]
    pub fn swagger_ui() -> Self {
        Self::from_swagger(&SwaggerUi::new())
    }

    /// Creates an asset set whose index page is the given Swagger UI page.
    #[must_use]
    pub fn from_swagger(swagger: &SwaggerUi) -> Self {
        Self::new().with_asset(INDEX_FILE, swagger.html_bytes())
    }

    /// Adds an asset. A leading `/` in `path` is ignored.
    #[must_use]
    pub fn with_asset(mut self, path: impl AsRef<str>, bytes: impl Into<Bytes>) -> Self {
        self.insert(path, DocAsset::new(bytes));
        self
    }

    /// Adds or replaces an asset.
    pub fn insert(&mut self, path: impl AsRef<str>, asset: DocAsset) {
        let key = path.as_ref().trim_start_matches('/').to_string();
        self.assets.insert(key, asset);
    }

    /// Returns the number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns true if there are no assets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl DocsAssets for EmbeddedDocs {
    fn get(&self, path: &str) -> DocsResult<Option<DocAsset>> {
        Ok(self.assets.get(path.trim_start_matches('/')).cloned())
    }
}

/// Assets read from a directory at request time.
///
/// # Example
///
/// ```rust
/// use gantry_docs::DirectoryDocs;
///
/// let docs = DirectoryDocs::new("./third_party/swagger-ui");
/// assert!(docs.root().ends_with("swagger-ui"));
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryDocs {
    root: PathBuf,
    serve_hidden: bool,
}

impl DirectoryDocs {
    /// Creates a provider rooted at `root`.
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            serve_hidden: false,
        }
    }

    /// Enables or disables serving hidden files (starting with `.`).
    #[must_use]
    pub fn serve_hidden(mut self, enabled: bool) -> Self {
        self.serve_hidden = enabled;
        self
    }

    /// Returns the root directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a request path to a file inside the root.
    ///
    /// Returns `Ok(None)` when nothing exists at the path.
    fn resolve_path(&self, request_path: &str) -> DocsResult<Option<PathBuf>> {
        let path = request_path.trim_start_matches('/');

        for component in Path::new(path).components() {
            match component {
                Component::ParentDir => {
                    return Err(DocsError::Forbidden(
                        "Directory traversal not allowed".to_string(),
                    ));
                }
                Component::Normal(name) => {
                    if !self.serve_hidden && name.to_str().is_some_and(|n| n.starts_with('.')) {
                        return Err(DocsError::Forbidden(
                            "Hidden files not allowed".to_string(),
                        ));
                    }
                }
                _ => {}
            }
        }

        let Ok(canonical) = self.root.join(path).canonicalize() else {
            return Ok(None);
        };
        let canonical_root = self.root.canonicalize()?;

        if !canonical.starts_with(&canonical_root) {
            return Err(DocsError::Forbidden(
                "Path escapes root directory".to_string(),
            ));
        }

        if canonical.is_dir() {
            let index = canonical.join(INDEX_FILE);
            return Ok(index.is_file().then_some(index));
        }

        Ok(Some(canonical))
    }
}

impl DocsAssets for DirectoryDocs {
    fn get(&self, path: &str) -> DocsResult<Option<DocAsset>> {
        let Some(file) = self.resolve_path(path)? else {
            return Ok(None);
        };

        let metadata = std::fs::metadata(&file)?;
        let bytes = std::fs::read(&file)?;

        Ok(Some(DocAsset {
            bytes: Bytes::from(bytes),
            modified: metadata.modified().ok(),
        }))
    }
}
