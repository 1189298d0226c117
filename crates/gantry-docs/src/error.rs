//! Error types for serving documentation assets.

use http::StatusCode;
use thiserror::Error;

/// Errors that can occur when resolving or serving documentation assets.
#[derive(Debug, Error)]
pub enum DocsError {
    /// The requested asset does not exist.
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// The path is forbidden (directory traversal or hidden file).
    #[error("Forbidden path: {0}")]
    Forbidden(String),

    /// Only `GET` and `HEAD` are served.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// I/O error while reading an asset.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocsError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type for documentation operations.
pub type DocsResult<T> = Result<T, DocsError>;
