//! Mapping `PostgreSQL` constraint violations to recorded errors.
//!
//! Meant for use inside
//! [`Action::handle_commit_fault`](bizrunner_core::Action::handle_commit_fault):
//!
//! ```ignore
//! async fn handle_commit_fault(&mut self, fault: &CommitFault) {
//!     if let Some(violation) = constraint_violation(fault) {
//!         if violation.is("projects_name_key") {
//!             self.status_mut().add_error(violation.for_member("name"));
//!         }
//!     }
//! }
//! ```

use std::fmt;

use bizrunner_core::{CommitFault, ValidationError};
use sqlx::error::{DatabaseError, ErrorKind};

use crate::error::DbError;

/// The kind of integrity constraint that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A `UNIQUE` or primary key constraint.
    Unique,
    /// A `FOREIGN KEY` constraint.
    ForeignKey,
    /// A `NOT NULL` constraint.
    NotNull,
    /// A `CHECK` constraint.
    Check,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unique => "unique",
            Self::ForeignKey => "foreign key",
            Self::NotNull => "not-null",
            Self::Check => "check",
        };
        f.write_str(label)
    }
}

/// An integrity constraint violation reported by `PostgreSQL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    /// What kind of constraint failed.
    pub kind: ViolationKind,
    /// Constraint name, when the server reported one.
    pub constraint: Option<String>,
    /// Table the constraint belongs to, when the server reported one.
    pub table: Option<String>,
}

impl ConstraintViolation {
    /// Whether the violated constraint is named `name`.
    pub fn is(&self, name: &str) -> bool {
        self.constraint.as_deref() == Some(name)
    }

    /// A generic error naming the constraint as its member.
    pub fn to_validation_error(&self) -> ValidationError {
        let message = match (&self.table, &self.constraint) {
            (Some(table), Some(constraint)) => {
                format!("{} constraint {constraint} on {table} was violated", self.kind)
            }
            (None, Some(constraint)) => {
                format!("{} constraint {constraint} was violated", self.kind)
            }
            (Some(table), None) => format!("{} constraint on {table} was violated", self.kind),
            (None, None) => format!("{} constraint was violated", self.kind),
        };
        match &self.constraint {
            Some(constraint) => ValidationError::for_member(constraint.clone(), message),
            None => ValidationError::new(message),
        }
    }

    /// An error attributed to the input member the constraint guards.
    pub fn for_member(&self, member: &str) -> ValidationError {
        let message = match self.kind {
            ViolationKind::Unique => format!("{member} is already taken"),
            ViolationKind::ForeignKey => format!("{member} refers to a record that does not exist"),
            ViolationKind::NotNull => format!("{member} is required"),
            ViolationKind::Check => format!("{member} is invalid"),
        };
        ValidationError::for_member(member, message)
    }
}

/// Extract a constraint violation from a commit fault.
///
/// Recognizes faults raised by [`PgUnitOfWork`](crate::PgUnitOfWork) (a
/// [`DbError::Postgres`]) as well as bare [`sqlx::Error`] values. Returns
/// `None` for every other fault, including connection failures.
pub fn constraint_violation(fault: &CommitFault) -> Option<ConstraintViolation> {
    let sqlx_error = match fault.downcast_ref::<DbError>() {
        Some(DbError::Postgres(error)) => error,
        Some(_) => return None,
        None => fault.downcast_ref::<sqlx::Error>()?,
    };
    let sqlx::Error::Database(db_error) = sqlx_error else {
        return None;
    };
    from_database_error(db_error.as_ref())
}

/// [`constraint_violation`] rendered as a generic [`ValidationError`].
pub fn constraint_violation_error(fault: &CommitFault) -> Option<ValidationError> {
    constraint_violation(fault).map(|violation| violation.to_validation_error())
}

fn from_database_error(error: &dyn DatabaseError) -> Option<ConstraintViolation> {
    let kind = match error.kind() {
        ErrorKind::UniqueViolation => ViolationKind::Unique,
        ErrorKind::ForeignKeyViolation => ViolationKind::ForeignKey,
        ErrorKind::NotNullViolation => ViolationKind::NotNull,
        ErrorKind::CheckViolation => ViolationKind::Check,
        _ => return None,
    };
    Some(ConstraintViolation {
        kind,
        constraint: error.constraint().map(str::to_owned),
        table: error.table().map(str::to_owned),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;

    use super::*;

    #[derive(Debug)]
    struct FakeDbError {
        kind: ErrorKind,
        constraint: Option<&'static str>,
        table: Option<&'static str>,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("fake database error")
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn table(&self) -> Option<&str> {
            self.table
        }
    }

    fn fault(kind: ErrorKind, constraint: Option<&'static str>) -> CommitFault {
        let error = sqlx::Error::Database(Box::new(FakeDbError {
            kind,
            constraint,
            table: Some("projects"),
        }));
        CommitFault::new(DbError::Postgres(error))
    }

    #[test]
    fn unique_violation_is_recognized() {
        let violation =
            constraint_violation(&fault(ErrorKind::UniqueViolation, Some("projects_name_key")))
                .unwrap();

        assert_eq!(violation.kind, ViolationKind::Unique);
        assert!(violation.is("projects_name_key"));
        assert_eq!(violation.table.as_deref(), Some("projects"));
    }

    #[test]
    fn generic_error_names_the_constraint() {
        let error =
            constraint_violation_error(&fault(ErrorKind::CheckViolation, Some("tasks_title_not_blank")))
                .unwrap();

        assert_eq!(error.members, vec![String::from("tasks_title_not_blank")]);
        assert_eq!(
            error.message,
            "check constraint tasks_title_not_blank on projects was violated"
        );
    }

    #[test]
    fn unnamed_constraint_has_no_member() {
        let error = constraint_violation_error(&fault(ErrorKind::NotNullViolation, None)).unwrap();
        assert!(error.members.is_empty());
        assert_eq!(error.message, "not-null constraint on projects was violated");
    }

    #[test]
    fn member_errors_describe_the_violation() {
        let violation =
            constraint_violation(&fault(ErrorKind::UniqueViolation, Some("projects_name_key")))
                .unwrap();
        assert_eq!(
            violation.for_member("name"),
            ValidationError::for_member("name", "name is already taken")
        );
    }

    #[test]
    fn bare_sqlx_errors_are_recognized() {
        let error = sqlx::Error::Database(Box::new(FakeDbError {
            kind: ErrorKind::ForeignKeyViolation,
            constraint: Some("tasks_project_id_fkey"),
            table: None,
        }));
        let violation = constraint_violation(&CommitFault::new(error)).unwrap();
        assert_eq!(violation.kind, ViolationKind::ForeignKey);
    }

    #[test]
    fn other_faults_are_ignored() {
        assert!(constraint_violation(&fault(ErrorKind::Other, Some("x"))).is_none());
        assert!(constraint_violation(&CommitFault::new(DbError::TransactionClosed)).is_none());
        assert!(constraint_violation(&CommitFault::new(sqlx::Error::PoolTimedOut)).is_none());
        assert!(constraint_violation(&CommitFault::new("connection reset")).is_none());
    }
}
