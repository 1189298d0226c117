//! Database error types.

use thiserror::Error;

/// Errors raised while creating or closing a pool.
#[derive(Debug, Error)]
pub enum DbError {
    /// The connection string could not be parsed or the first connection
    /// failed.
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
}

/// Errors raised by [`Database::in_tx`](crate::Database::in_tx).
///
/// `E` is the error type of the transaction body.
#[derive(Debug, Error)]
pub enum TxError<E>
where
    E: std::error::Error + 'static,
{
    /// The transaction could not be started.
    #[error("start transaction: {0}")]
    Start(#[source] sqlx::Error),

    /// The body failed and the rollback failed as well.
    #[error("rollback transaction: {source} (rolling back after: {cause})")]
    Rollback {
        /// The rollback error.
        source: sqlx::Error,
        /// The body error that triggered the rollback.
        cause: E,
    },

    /// The body succeeded but the commit failed.
    #[error("commit transaction: {0}")]
    Commit(#[source] sqlx::Error),

    /// The body failed and the transaction was rolled back.
    #[error("transaction aborted: {0}")]
    Aborted(#[source] E),
}

impl<E> TxError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the body's error, if the body is what failed.
    pub fn into_cause(self) -> Option<E> {
        match self {
            Self::Aborted(cause) | Self::Rollback { cause, .. } => Some(cause),
            Self::Start(_) | Self::Commit(_) => None,
        }
    }

    /// Returns `true` if the transaction was rolled back cleanly.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}
