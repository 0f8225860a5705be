//! Action contracts.
//!
//! An action is a single-use unit of domain logic. Its contract varies along
//! four independent axes, all expressed through one trait:
//!
//! | Axis | How it is expressed |
//! |------|---------------------|
//! | input / no input | `type Input` (use `()` for none) |
//! | output / no output | `type Output` (use `()` for none) |
//! | global / project-scoped | `Input = InProject<T>` |
//! | write / read-only | `const REQUIRES_WRITE` |
//!
//! The optional commit-fault adapter is the provided method
//! [`Action::handle_commit_fault`]; leaving it alone means commit faults
//! propagate to the caller unchanged.

use std::future::Future;

use bizrunner_types::ProjectId;

use crate::status::Status;
use crate::unit_of_work::CommitFault;

/// Access to the [`Status`] an action owns.
///
/// Every action carries exactly one status, created fresh with the action
/// and never shared across invocations.
pub trait ActionStatus {
    /// The action's status.
    fn status(&self) -> &Status;

    /// Mutable access for recording errors and setting the message.
    fn status_mut(&mut self) -> &mut Status;

    /// Whether the action has recorded at least one error.
    fn has_errors(&self) -> bool {
        self.status().has_errors()
    }
}

/// A unit of domain logic run once by a [`Runner`](crate::runner::Runner).
///
/// By the time [`run`](Action::run) returns, the action has either produced
/// a result or recorded at least one error in its status. It may do both
/// (warnings alongside a value); the runner then treats
/// [`has_errors`](ActionStatus::has_errors) as authoritative and hands the
/// caller `Output::default()` instead of the value.
pub trait Action: ActionStatus + Send {
    /// What the business method consumes. `()` for actions without input.
    type Input: Send;

    /// What the business method produces. `()` for actions without output.
    ///
    /// `Default` supplies the placeholder returned on every error path.
    type Output: Default + Send;

    /// Whether a successful, error-free run must be followed by a commit.
    const REQUIRES_WRITE: bool = false;

    /// The business method.
    fn run(&mut self, input: Self::Input) -> impl Future<Output = Self::Output> + Send;

    /// Inspect a commit fault and optionally record it as an error.
    ///
    /// Called by the runner whenever [`UnitOfWork::commit`] fails. If this
    /// leaves at least one error in the status, the fault is swallowed and
    /// the caller receives `Output::default()`. If no error is recorded the
    /// fault propagates as [`RunnerError::Commit`].
    ///
    /// The default records nothing.
    ///
    /// [`UnitOfWork::commit`]: crate::unit_of_work::UnitOfWork::commit
    /// [`RunnerError::Commit`]: crate::runner::RunnerError::Commit
    fn handle_commit_fault(&mut self, fault: &CommitFault) -> impl Future<Output = ()> + Send {
        let _ = fault;
        async {}
    }
}

/// Input of a project-scoped action: the payload plus the project it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InProject<T> {
    /// The project the action operates on.
    pub project_id: ProjectId,
    /// The action's own input.
    pub input: T,
}

impl<T> InProject<T> {
    /// Pair an input with the project it targets.
    pub const fn new(project_id: ProjectId, input: T) -> Self {
        Self { project_id, input }
    }

    /// Split back into project ID and payload.
    pub fn into_parts(self) -> (ProjectId, T) {
        (self.project_id, self.input)
    }
}

impl InProject<()> {
    /// Scope an input-less action to a project.
    pub const fn only(project_id: ProjectId) -> Self {
        Self {
            project_id,
            input: (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_parts_moves_owned_payload_out() {
        let project_id = ProjectId::new();
        let scoped = InProject::new(project_id, vec![String::from("draft"), String::from("review")]);

        let (id, titles) = scoped.into_parts();

        assert_eq!(id, project_id);
        assert_eq!(titles, ["draft", "review"]);
    }

    #[test]
    fn only_carries_unit_payload() {
        let project_id = ProjectId::new();
        assert_eq!(InProject::only(project_id).into_parts(), (project_id, ()));
    }
}
