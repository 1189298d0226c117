//! # Gantry Docs
//!
//! Documentation assets served next to the API descriptor.
//!
//! This crate provides:
//! - **[`DocsAssets`]**: the provider trait the server reads assets through
//! - **[`EmbeddedDocs`]**: an in-memory asset set, by default a single
//!   Swagger UI page
//! - **[`DirectoryDocs`]**: assets read from a directory on disk
//! - **[`SwaggerUi`]**: generation of the Swagger UI HTML page
//! - **[`DocsService`]**: the HTTP semantics (methods, index files, content
//!   types and conditional requests)
//!
//! ## Quick Start
//!
//! ```rust
//! use gantry_docs::{DocsAssets, EmbeddedDocs};
//!
//! let docs = EmbeddedDocs::swagger_ui();
//! let index = docs.get("index.html").unwrap().unwrap();
//! assert!(std::str::from_utf8(&index.bytes).unwrap().contains("./api.swagger.json"));
//! ```

mod assets;
mod error;
mod service;
mod swagger;

pub use assets::{DirectoryDocs, DocAsset, DocsAssets, EmbeddedDocs, INDEX_FILE};
pub use error::{DocsError, DocsResult};
pub use service::{detect_mime_type, DocsService};
pub use swagger::{SwaggerUi, DEFAULT_CDN, DEFAULT_SPEC_URL};
