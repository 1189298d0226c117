//! Gateway error types.

use thiserror::Error;

/// Errors raised while registering gateway routes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The path template could not be parsed.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The rejected template.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl GatewayError {
    /// Creates an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_display() {
        let err = GatewayError::invalid_pattern("/users/{", "unclosed parameter");
        assert_eq!(
            err.to_string(),
            "Invalid pattern '/users/{': unclosed parameter"
        );
    }
}
