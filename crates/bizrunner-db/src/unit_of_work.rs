//! [`UnitOfWork`] over a single `PostgreSQL` transaction.
//!
//! A [`PgUnitOfWork`] is a cheap, cloneable handle. The caller opens it,
//! hands one clone to each action that needs to run queries and lends
//! `&mut` to the [`Runner`](bizrunner_core::Runner), which commits it. The
//! transaction sits behind an async mutex so concurrent clones are
//! serialized.
//!
//! If the last handle is dropped while the transaction is still open, `sqlx`
//! rolls it back.

use std::sync::Arc;

use bizrunner_core::{CommitFault, UnitOfWork};
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, OwnedMappedMutexGuard, OwnedMutexGuard};

use crate::error::DbError;

type Slot = Option<Transaction<'static, Postgres>>;

/// Exclusive access to the open transaction of a [`PgUnitOfWork`].
///
/// Owns its share of the handle, so it can be held across `.await` points
/// inside an action's `Send` future.
pub type TransactionGuard =
    OwnedMappedMutexGuard<Option<Transaction<'static, Postgres>>, Transaction<'static, Postgres>>;

/// Transactional session backed by one `PostgreSQL` transaction.
#[derive(Debug, Clone)]
pub struct PgUnitOfWork {
    slot: Arc<Mutex<Slot>>,
}

impl PgUnitOfWork {
    /// Begin a transaction on `pool`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if no connection could be acquired.
    pub async fn begin(pool: &PgPool) -> Result<Self, DbError> {
        let tx = pool.begin().await?;
        tracing::debug!("Opened unit of work");
        Ok(Self {
            slot: Arc::new(Mutex::new(Some(tx))),
        })
    }

    /// Lock the open transaction for running queries.
    ///
    /// Execute queries with `&mut **guard`. Hold the guard only as long as
    /// needed; other clones wait on it.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionClosed`] after commit or rollback.
    pub async fn transaction(&self) -> Result<TransactionGuard, DbError> {
        let guard = Arc::clone(&self.slot).lock_owned().await;
        OwnedMutexGuard::try_map(guard, Option::as_mut).map_err(|_| DbError::TransactionClosed)
    }

    /// Whether the transaction is still open.
    pub async fn is_open(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionClosed`] if already committed or rolled
    /// back, or [`DbError::Postgres`] if `PostgreSQL` rejects the commit
    /// (e.g. a deferred constraint fails).
    pub async fn commit_transaction(&self) -> Result<(), DbError> {
        let tx = self.take().await?;
        tx.commit().await?;
        tracing::debug!("Committed unit of work");
        Ok(())
    }

    /// Roll back the transaction, discarding every change made through it.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionClosed`] if already committed or rolled
    /// back, or [`DbError::Postgres`] if the rollback fails.
    pub async fn rollback(&self) -> Result<(), DbError> {
        let tx = self.take().await?;
        tx.rollback().await?;
        tracing::debug!("Rolled back unit of work");
        Ok(())
    }

    async fn take(&self) -> Result<Transaction<'static, Postgres>, DbError> {
        self.slot
            .lock()
            .await
            .take()
            .ok_or(DbError::TransactionClosed)
    }
}

impl UnitOfWork for PgUnitOfWork {
    async fn commit(&mut self) -> Result<(), CommitFault> {
        self.commit_transaction().await.map_err(CommitFault::new)
    }
}
