//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors. When a [`PgUnitOfWork`](crate::PgUnitOfWork) commit fails
//! the [`DbError`] travels inside the
//! [`CommitFault`](bizrunner_core::CommitFault) so actions can downcast it.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The unit of work's transaction was already committed or rolled back.
    #[error("transaction already closed")]
    TransactionClosed,
}
