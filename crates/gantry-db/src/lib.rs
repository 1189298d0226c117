//! PostgreSQL access for Gantry services.
//!
//! [`Database`] wraps a `sqlx` connection pool and adds [`Database::in_tx`],
//! which runs a closure inside a transaction and commits or rolls back
//! depending on its result.
//!
//! ```rust,no_run
//! use gantry_db::{Database, TxError};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://app@localhost/app").await?;
//!
//! db.in_tx(|tx| {
//!     Box::pin(async move {
//!         sqlx::query("UPDATE accounts SET balance = balance - 10 WHERE id = 1")
//!             .execute(&mut **tx)
//!             .await?;
//!         Ok::<_, sqlx::Error>(())
//!     })
//! })
//! .await?;
//!
//! db.close().await;
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/gantry-db/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod database;
mod error;

pub use database::{Database, DbOptions, PgTransaction};
pub use error::{DbError, TxError};
