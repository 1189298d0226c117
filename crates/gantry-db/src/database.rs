//! Pool construction and the transaction helper.

use std::time::Duration;

use gantry_core::BoxFuture;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use crate::error::{DbError, TxError};

/// A transaction handed to [`Database::in_tx`] closures.
pub type PgTransaction = Transaction<'static, Postgres>;

/// Pool sizing and timeouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbOptions {
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// Connections kept open when idle.
    pub min_connections: u32,
    /// How long `acquire` waits before failing.
    pub acquire_timeout: Duration,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl DbOptions {
    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
    }
}

/// A PostgreSQL connection pool.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connects with default [`DbOptions`].
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connect` if the DSN is invalid or the first
    /// connection cannot be established.
    pub async fn connect(dsn: &str) -> Result<Self, DbError> {
        Self::connect_with(dsn, DbOptions::default()).await
    }

    /// Connects and waits for the first connection.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connect` if the DSN is invalid or the first
    /// connection cannot be established.
    pub async fn connect_with(dsn: &str, options: DbOptions) -> Result<Self, DbError> {
        let pool = options
            .pool_options()
            .connect(dsn)
            .await
            .map_err(DbError::Connect)?;

        tracing::info!(max_connections = options.max_connections, "database pool connected");
        Ok(Self { pool })
    }

    /// Creates a pool that connects on first use.
    ///
    /// Only the DSN is checked here.
    ///
    /// # Errors
    ///
    /// Returns `DbError::Connect` if the DSN cannot be parsed.
    pub fn connect_lazy(dsn: &str, options: DbOptions) -> Result<Self, DbError> {
        let pool = options
            .pool_options()
            .connect_lazy(dsn)
            .map_err(DbError::Connect)?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool for queries outside a transaction.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs `f` inside a transaction.
    ///
    /// The transaction is committed if `f` returns `Ok` and rolled back
    /// otherwise. A failed rollback is reported together with the error
    /// that caused it.
    ///
    /// # Errors
    ///
    /// - `TxError::Start` if no transaction could be opened
    /// - `TxError::Aborted` if `f` failed and the rollback succeeded
    /// - `TxError::Rollback` if `f` failed and so did the rollback
    /// - `TxError::Commit` if `f` succeeded but the commit failed
    pub async fn in_tx<T, E, F>(&self, f: F) -> Result<T, TxError<E>>
    where
        E: std::error::Error + 'static,
        F: for<'c> FnOnce(&'c mut PgTransaction) -> BoxFuture<'c, Result<T, E>>,
    {
        let mut tx = self.pool.begin().await.map_err(TxError::Start)?;

        match f(&mut tx).await {
            Ok(value) => {
                tx.commit().await.map_err(TxError::Commit)?;
                Ok(value)
            }
            Err(cause) => match tx.rollback().await {
                Ok(()) => Err(TxError::Aborted(cause)),
                Err(source) => {
                    tracing::error!(error = %source, cause = %cause, "transaction rollback failed");
                    Err(TxError::Rollback { source, cause })
                }
            },
        }
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
