//! The persistence capability the runner commits through.
//!
//! The runner never opens, rolls back, or closes a unit of work. It borrows
//! one for the duration of a single action invocation and calls
//! [`UnitOfWork::commit`] at most once, only after the action finished
//! without recording errors.

use std::error::Error as StdError;
use std::future::Future;

/// Boxed infrastructure error carried by a [`CommitFault`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An infrastructure-level failure raised while committing.
///
/// Distinct from validation and business-rule errors: a commit fault is
/// fatal unless the action downgrades it to a recorded error in
/// [`Action::handle_commit_fault`](crate::action::Action::handle_commit_fault).
#[derive(Debug, thiserror::Error)]
#[error("commit failed: {source}")]
pub struct CommitFault {
    /// The underlying persistence error.
    #[source]
    source: BoxError,
}

impl CommitFault {
    /// Wrap a persistence error.
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Borrow the underlying error.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.source.as_ref()
    }

    /// Downcast the underlying error to a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.source.downcast_ref::<E>()
    }

    /// Unwrap into the boxed underlying error.
    pub fn into_inner(self) -> BoxError {
        self.source
    }
}

/// A transactional session whose accumulated changes can be persisted.
///
/// Implementations decide what "commit" means (a database transaction, an
/// in-memory change set, a batch of outbound writes). The handle's lifecycle
/// belongs to the caller that created it.
pub trait UnitOfWork: Send {
    /// Durably persist all accumulated changes.
    ///
    /// # Errors
    ///
    /// Returns a [`CommitFault`] describing the underlying failure, e.g. a
    /// constraint violation or a lost connection.
    fn commit(&mut self) -> impl Future<Output = Result<(), CommitFault>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("duplicate key")]
    struct DuplicateKey;

    #[test]
    fn downcast_recovers_concrete_error() {
        let fault = CommitFault::new(DuplicateKey);
        assert!(fault.downcast_ref::<DuplicateKey>().is_some());
        assert!(fault.downcast_ref::<std::io::Error>().is_none());
        assert_eq!(fault.to_string(), "commit failed: duplicate key");
    }

    #[test]
    fn string_errors_are_accepted() {
        let fault = CommitFault::new("connection reset");
        assert_eq!(fault.inner().to_string(), "connection reset");
    }

    #[test]
    fn into_inner_hands_back_the_boxed_source() {
        let source = CommitFault::new(DuplicateKey).into_inner();
        assert!(source.downcast_ref::<DuplicateKey>().is_some());
        assert_eq!(source.to_string(), "duplicate key");
    }
}
