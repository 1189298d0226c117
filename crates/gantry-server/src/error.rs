//! Server error types.

use std::net::SocketAddr;

use thiserror::Error;

use crate::events::ListenerKind;

/// Errors that can occur while configuring or running the listeners.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configuration was rejected by the builder.
    #[error("Invalid server configuration: {0}")]
    InvalidConfig(String),

    /// A listener could not bind its address.
    #[error("Failed to bind {listener} listener to {addr}: {source}")]
    Bind {
        /// Which listener failed.
        listener: ListenerKind,
        /// The address it tried to bind.
        addr: SocketAddr,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A listener stopped serving with an error.
    #[error("{listener} listener failed: {reason}")]
    Serve {
        /// Which listener failed.
        listener: ListenerKind,
        /// What went wrong.
        reason: String,
    },
}

impl ServerError {
    /// Returns the listener the error belongs to, if any.
    #[must_use]
    pub fn listener(&self) -> Option<ListenerKind> {
        match self {
            Self::InvalidConfig(_) => None,
            Self::Bind { listener, .. } | Self::Serve { listener, .. } => Some(*listener),
        }
    }
}
