//! The commit-gated action runner.
//!
//! A [`Runner`] binds one action instance to one borrowed unit of work and
//! executes the action exactly once:
//!
//! 1. Invoke the action's business method.
//! 2. If the action recorded errors, skip the commit and hand back
//!    `Output::default()`.
//! 3. Otherwise, for write-required actions, commit the unit of work. A
//!    commit fault is offered to [`Action::handle_commit_fault`] and either
//!    becomes a recorded error or propagates as [`RunnerError::Commit`].
//! 4. Return the action's output.

use std::any::type_name;

use bizrunner_types::ProjectId;
use tracing::{debug, error, info, warn};

use crate::action::{Action, ActionStatus, InProject};
use crate::config::RunnerConfig;
use crate::status::Status;
use crate::unit_of_work::{CommitFault, UnitOfWork};

/// Errors returned by [`Runner::execute`].
///
/// Validation and business-rule failures are never returned here; they are
/// recorded in the action's [`Status`].
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The runner has already started executing its action.
    #[error("action has already been executed by this runner")]
    AlreadyExecuted,

    /// The commit failed and the action did not record it as an error.
    #[error(transparent)]
    Commit(#[from] CommitFault),
}

/// Where a runner is in its single execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Built but not yet executed.
    Created,
    /// The business method is in progress.
    Running,
    /// The business method returned; the commit decision is pending.
    ActionRan,
    /// Execution finished.
    Done(RunOutcome),
}

/// How a finished execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The action was error-free and the unit of work committed.
    Committed,
    /// The action was error-free and read-only, so nothing was committed.
    Skipped,
    /// Errors were recorded, either by the action or by its commit-fault
    /// adapter. The caller received the default output.
    ErrorAfterRun,
    /// The commit failed and the fault was returned to the caller.
    CommitFaulted,
}

/// Executes one action against one borrowed unit of work.
#[derive(Debug)]
pub struct Runner<'u, A, U> {
    action: A,
    unit_of_work: &'u mut U,
    config: RunnerConfig,
    phase: RunPhase,
}

impl<'u, A, U> Runner<'u, A, U>
where
    A: Action,
    U: UnitOfWork,
{
    /// Bind `action` to `unit_of_work` with the default configuration.
    pub fn new(action: A, unit_of_work: &'u mut U) -> Self {
        Self::with_config(action, unit_of_work, RunnerConfig::default())
    }

    /// Bind `action` to `unit_of_work` with an explicit configuration.
    pub const fn with_config(action: A, unit_of_work: &'u mut U, config: RunnerConfig) -> Self {
        Self {
            action,
            unit_of_work,
            config,
            phase: RunPhase::Created,
        }
    }

    /// Run the action and commit when it succeeded and requires a write.
    ///
    /// Returns `Output::default()` whenever the action's status has errors
    /// after the run (or after the commit-fault adapter), even if the
    /// business method produced a value.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::AlreadyExecuted`] if this runner has already
    /// started an execution, or [`RunnerError::Commit`] if the commit failed
    /// and the action did not record the fault as an error.
    pub async fn execute(&mut self, input: A::Input) -> Result<A::Output, RunnerError> {
        if self.phase != RunPhase::Created {
            warn!(action = type_name::<A>(), phase = ?self.phase, "Refusing to execute action twice");
            return Err(RunnerError::AlreadyExecuted);
        }

        let action = type_name::<A>();
        self.phase = RunPhase::Running;
        debug!(action, requires_write = A::REQUIRES_WRITE, "Running action");

        let output = self.action.run(input).await;
        self.phase = RunPhase::ActionRan;

        if self.action.has_errors() {
            warn!(
                action,
                errors = self.action.status().error_count(),
                "Action recorded errors, skipping commit"
            );
            self.phase = RunPhase::Done(RunOutcome::ErrorAfterRun);
            return Ok(A::Output::default());
        }

        if !A::REQUIRES_WRITE {
            debug!(action, "Read-only action finished");
            self.phase = RunPhase::Done(RunOutcome::Skipped);
            return Ok(output);
        }

        match self.unit_of_work.commit().await {
            Ok(()) => {
                self.stamp_saved_message();
                self.phase = RunPhase::Done(RunOutcome::Committed);
                info!(action, "Committed action changes");
                Ok(output)
            }
            Err(fault) => {
                self.action.handle_commit_fault(&fault).await;
                if self.action.has_errors() {
                    warn!(
                        action,
                        error = %fault,
                        errors = self.action.status().error_count(),
                        "Commit fault recorded as action error"
                    );
                    self.phase = RunPhase::Done(RunOutcome::ErrorAfterRun);
                    Ok(A::Output::default())
                } else {
                    error!(action, error = %fault, "Commit failed");
                    self.phase = RunPhase::Done(RunOutcome::CommitFaulted);
                    Err(RunnerError::Commit(fault))
                }
            }
        }
    }

    fn stamp_saved_message(&mut self) {
        let Some(saved) = self.config.saved_message.as_deref() else {
            return;
        };
        let status = self.action.status_mut();
        if status.message().is_empty() {
            status.set_message(saved);
        } else {
            let combined = format!("{} {saved}", status.message());
            status.set_message(combined);
        }
    }
}

impl<'u, A, U, T> Runner<'u, A, U>
where
    A: Action<Input = InProject<T>>,
    U: UnitOfWork,
    T: Send,
{
    /// [`execute`](Self::execute) for project-scoped actions.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub async fn execute_in_project(
        &mut self,
        project_id: ProjectId,
        input: T,
    ) -> Result<A::Output, RunnerError> {
        self.execute(InProject::new(project_id, input)).await
    }
}

impl<A, U> Runner<'_, A, U>
where
    A: ActionStatus,
{
    /// The action's status.
    pub fn status(&self) -> &Status {
        self.action.status()
    }

    /// The bound action.
    pub const fn action(&self) -> &A {
        &self.action
    }

    /// Release the final status, e.g. once the unit of work is needed again.
    ///
    /// The action is consumed with the runner and never handed back, so an
    /// action instance runs at most once.
    pub fn into_status(mut self) -> Status {
        std::mem::take(self.action.status_mut())
    }

    /// Current execution phase.
    pub const fn phase(&self) -> RunPhase {
        self.phase
    }
}

/// Build a [`Runner`] straight from an action.
pub trait IntoRunner: Action + Sized {
    /// Bind this action to `unit_of_work` with the default configuration.
    fn into_runner<U: UnitOfWork>(self, unit_of_work: &mut U) -> Runner<'_, Self, U>;
}

impl<A: Action> IntoRunner for A {
    fn into_runner<U: UnitOfWork>(self, unit_of_work: &mut U) -> Runner<'_, Self, U> {
        Runner::new(self, unit_of_work)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use bizrunner_types::ValidationError;

    use super::*;
    use crate::validation::ActionErrors;

    type Journal = Arc<Mutex<Vec<&'static str>>>;

    struct RecordingUnitOfWork {
        journal: Journal,
        commits: usize,
        fail_with: Option<&'static str>,
    }

    impl RecordingUnitOfWork {
        fn new(journal: &Journal) -> Self {
            Self {
                journal: Arc::clone(journal),
                commits: 0,
                fail_with: None,
            }
        }

        fn failing(journal: &Journal, reason: &'static str) -> Self {
            Self {
                fail_with: Some(reason),
                ..Self::new(journal)
            }
        }
    }

    impl UnitOfWork for RecordingUnitOfWork {
        async fn commit(&mut self) -> Result<(), CommitFault> {
            self.commits += 1;
            self.journal.lock().unwrap().push("commit");
            match self.fail_with {
                Some(reason) => Err(CommitFault::new(reason)),
                None => Ok(()),
            }
        }
    }

    /// Action whose behaviour is scripted per test. `WRITE` picks the
    /// write-required marker.
    struct Scripted<const WRITE: bool> {
        status: Status,
        journal: Journal,
        output: u32,
        record: Option<&'static str>,
        absorb_faults: bool,
    }

    impl<const WRITE: bool> Scripted<WRITE> {
        fn new(journal: &Journal, output: u32) -> Self {
            Self {
                status: Status::new(),
                journal: Arc::clone(journal),
                output,
                record: None,
                absorb_faults: false,
            }
        }
    }

    impl<const WRITE: bool> ActionStatus for Scripted<WRITE> {
        fn status(&self) -> &Status {
            &self.status
        }

        fn status_mut(&mut self) -> &mut Status {
            &mut self.status
        }
    }

    impl<const WRITE: bool> Action for Scripted<WRITE> {
        type Input = u32;
        type Output = u32;
        const REQUIRES_WRITE: bool = WRITE;

        async fn run(&mut self, input: u32) -> u32 {
            self.journal.lock().unwrap().push("run");
            if let Some(message) = self.record {
                self.status.add_error(ValidationError::new(message));
            }
            self.output + input
        }

        async fn handle_commit_fault(&mut self, fault: &CommitFault) {
            if self.absorb_faults {
                self.status
                    .add_error(ValidationError::new(format!("could not save: {}", fault.inner())));
            }
        }
    }

    struct Scoped {
        status: Status,
    }

    impl ActionStatus for Scoped {
        fn status(&self) -> &Status {
            &self.status
        }

        fn status_mut(&mut self) -> &mut Status {
            &mut self.status
        }
    }

    impl Action for Scoped {
        type Input = InProject<String>;
        type Output = String;

        async fn run(&mut self, input: InProject<String>) -> String {
            let (project_id, name) = input.into_parts();
            if name.is_empty() {
                return self.return_error(ValidationError::for_member("name", "name is required"));
            }
            format!("{name}@{project_id}")
        }
    }

    /// Write action whose business method never completes.
    struct Stalled {
        status: Status,
        journal: Journal,
    }

    impl ActionStatus for Stalled {
        fn status(&self) -> &Status {
            &self.status
        }

        fn status_mut(&mut self) -> &mut Status {
            &mut self.status
        }
    }

    impl Action for Stalled {
        type Input = ();
        type Output = u32;
        const REQUIRES_WRITE: bool = true;

        async fn run(&mut self, (): ()) -> u32 {
            self.journal.lock().unwrap().push("run");
            std::future::pending().await
        }
    }

    fn journal() -> Journal {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(journal: &Journal) -> Vec<&'static str> {
        journal.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn write_action_commits_once_after_run() {
        let journal = journal();
        let mut uow = RecordingUnitOfWork::new(&journal);
        let mut runner = Scripted::<true>::new(&journal, 40).into_runner(&mut uow);

        let output = runner.execute(2).await.unwrap();

        assert_eq!(output, 42);
        assert_eq!(runner.phase(), RunPhase::Done(RunOutcome::Committed));
        assert!(!runner.status().has_errors());
        drop(runner);
        assert_eq!(uow.commits, 1);
        assert_eq!(entries(&journal), vec!["run", "commit"]);
    }

    #[tokio::test]
    async fn read_only_action_never_commits() {
        let journal = journal();
        let mut uow = RecordingUnitOfWork::new(&journal);
        let mut runner = Runner::new(Scripted::<false>::new(&journal, 7), &mut uow);

        assert_eq!(runner.execute(0).await.unwrap(), 7);
        assert_eq!(runner.phase(), RunPhase::Done(RunOutcome::Skipped));
        drop(runner);
        assert_eq!(uow.commits, 0);
        assert_eq!(entries(&journal), vec!["run"]);
    }

    #[tokio::test]
    async fn recorded_errors_discard_output_and_skip_commit() {
        let journal = journal();
        let mut uow = RecordingUnitOfWork::new(&journal);
        let mut action = Scripted::<true>::new(&journal, 99);
        action.record = Some("quota exceeded");
        let mut runner = Runner::new(action, &mut uow);

        let output = runner.execute(1).await.unwrap();

        assert_eq!(output, 0);
        assert_eq!(runner.phase(), RunPhase::Done(RunOutcome::ErrorAfterRun));
        assert_eq!(runner.status().error_summary("; "), "quota exceeded");
        drop(runner);
        assert_eq!(uow.commits, 0);
    }

    #[tokio::test]
    async fn absorbed_commit_fault_yields_default_output() {
        let journal = journal();
        let mut uow = RecordingUnitOfWork::failing(&journal, "duplicate key");
        let mut action = Scripted::<true>::new(&journal, 5);
        action.absorb_faults = true;
        let mut runner = Runner::new(action, &mut uow);

        let output = runner.execute(5).await.unwrap();

        assert_eq!(output, 0);
        assert_eq!(runner.phase(), RunPhase::Done(RunOutcome::ErrorAfterRun));
        assert_eq!(
            runner.status().errors()[0].message,
            "could not save: duplicate key"
        );
    }

    #[tokio::test]
    async fn unabsorbed_commit_fault_propagates() {
        let journal = journal();
        let mut uow = RecordingUnitOfWork::failing(&journal, "connection reset");
        let mut runner = Runner::new(Scripted::<true>::new(&journal, 5), &mut uow);

        let err = runner.execute(5).await.unwrap_err();

        assert!(matches!(err, RunnerError::Commit(_)));
        assert_eq!(err.to_string(), "commit failed: connection reset");
        assert_eq!(runner.phase(), RunPhase::Done(RunOutcome::CommitFaulted));
        assert!(!runner.status().has_errors());
    }

    #[tokio::test]
    async fn second_execute_is_refused_without_running() {
        let journal = journal();
        let mut uow = RecordingUnitOfWork::new(&journal);
        let mut runner = Runner::new(Scripted::<true>::new(&journal, 1), &mut uow);

        runner.execute(0).await.unwrap();
        let second = runner.execute(0).await;

        assert!(matches!(second, Err(RunnerError::AlreadyExecuted)));
        assert_eq!(runner.phase(), RunPhase::Done(RunOutcome::Committed));
        drop(runner);
        assert_eq!(entries(&journal), vec!["run", "commit"]);
    }

    #[tokio::test]
    async fn saved_message_is_stamped_after_commit() {
        let journal = journal();
        let config = RunnerConfig {
            saved_message: Some(String::from("Saved.")),
        };

        let mut uow = RecordingUnitOfWork::new(&journal);

        let mut fresh = Runner::with_config(Scripted::<true>::new(&journal, 0), &mut uow, config.clone());
        fresh.execute(0).await.unwrap();
        assert_eq!(fresh.status().message(), "Saved.");
        drop(fresh);

        let mut action = Scripted::<true>::new(&journal, 0);
        action.status.set_message("Project created.");
        let mut appended = Runner::with_config(action, &mut uow, config.clone());
        appended.execute(0).await.unwrap();
        assert_eq!(appended.status().message(), "Project created. Saved.");
        drop(appended);

        let mut read_only = Runner::with_config(Scripted::<false>::new(&journal, 0), &mut uow, config);
        read_only.execute(0).await.unwrap();
        assert_eq!(read_only.status().message(), "");
    }

    #[tokio::test]
    async fn project_scoped_input_is_paired() {
        let journal = journal();
        let mut uow = RecordingUnitOfWork::new(&journal);
        let project_id = ProjectId::new();
        let mut runner = Scoped {
            status: Status::new(),
        }
        .into_runner(&mut uow);

        let output = runner
            .execute_in_project(project_id, String::from("roadmap"))
            .await
            .unwrap();

        assert_eq!(output, format!("roadmap@{project_id}"));
        assert_eq!(runner.phase(), RunPhase::Done(RunOutcome::Skipped));
    }

    #[tokio::test]
    async fn into_status_returns_final_status() {
        let journal = journal();
        let mut uow = RecordingUnitOfWork::new(&journal);
        let mut runner = Scoped {
            status: Status::new(),
        }
        .into_runner(&mut uow);

        let output = runner
            .execute_in_project(ProjectId::new(), String::new())
            .await
            .unwrap();
        let status = runner.into_status();

        assert_eq!(output, "");
        assert_eq!(
            status.errors(),
            &[ValidationError::for_member("name", "name is required")]
        );
    }

    #[tokio::test]
    async fn finished_runner_gives_back_only_its_status() {
        let journal = journal();
        let mut uow = RecordingUnitOfWork::new(&journal);
        let mut action = Scripted::<true>::new(&journal, 3);
        action.status.set_message("Imported.");
        let mut runner = Runner::new(action, &mut uow);

        assert_eq!(runner.execute(0).await.unwrap(), 3);
        let status = runner.into_status();

        assert_eq!(status.message(), "Imported.");
        assert!(!status.has_errors());
        assert_eq!(uow.commits, 1);
        assert_eq!(entries(&journal), vec!["run", "commit"]);
    }

    #[tokio::test]
    async fn dropped_execution_stays_running_and_refuses_reentry() {
        let journal = journal();
        let mut uow = RecordingUnitOfWork::new(&journal);
        let action = Stalled {
            status: Status::new(),
            journal: Arc::clone(&journal),
        };
        let mut runner = Runner::new(action, &mut uow);

        let attempt = tokio::time::timeout(Duration::from_millis(20), runner.execute(())).await;
        assert!(attempt.is_err());
        assert_eq!(runner.phase(), RunPhase::Running);

        let retry = runner.execute(()).await;
        assert!(matches!(retry, Err(RunnerError::AlreadyExecuted)));
        assert_eq!(runner.phase(), RunPhase::Running);
        drop(runner);
        assert_eq!(uow.commits, 0);
        assert_eq!(entries(&journal), vec!["run"]);
    }
}
