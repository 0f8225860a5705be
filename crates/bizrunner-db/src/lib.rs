//! `PostgreSQL` data layer for bizrunner actions.
//!
//! Provides the connection pool, a [`UnitOfWork`](bizrunner_core::UnitOfWork)
//! implementation over one `sqlx` transaction, and helpers that turn
//! integrity constraint violations inside a commit fault into recorded
//! validation errors.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`unit_of_work`] -- [`PgUnitOfWork`], the transactional session
//! - [`fault`] -- Constraint violation mapping for commit faults
//! - [`error`] -- Shared error types

pub mod error;
pub mod fault;
pub mod postgres;
pub mod unit_of_work;

// Re-export primary types for convenience.
pub use error::DbError;
pub use fault::{ConstraintViolation, ViolationKind, constraint_violation, constraint_violation_error};
pub use postgres::{PostgresConfig, PostgresPool};
pub use unit_of_work::{PgUnitOfWork, TransactionGuard};
