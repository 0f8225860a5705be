//! Sample project and task actions.
//!
//! Each action holds a clone of the [`PgUnitOfWork`] it runs queries
//! through; the runner that executes it holds the same handle and commits
//! it.
//!
//! | Action | Input | Output | Writes |
//! |--------|-------|--------|--------|
//! | [`CreateProject`] | [`NewProject`] | `Option<ProjectId>` | yes |
//! | [`AddTask`] | `InProject<NewTask>` | none | yes |
//! | [`CountTasks`] | `InProject<()>` | [`TaskSummary`] | no |

use bizrunner_core::{
    Action, ActionErrors, ActionStatus, CommitFault, InProject, Status, ValidationError,
};
use bizrunner_db::{ConstraintViolation, DbError, PgUnitOfWork, constraint_violation};
use bizrunner_types::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Unique constraint on `projects.name`.
const PROJECT_NAME_KEY: &str = "projects_name_key";

/// Foreign key from `tasks.project_id` to `projects.id`.
const TASK_PROJECT_FKEY: &str = "tasks_project_id_fkey";

/// Input of [`CreateProject`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewProject {
    /// Display name, unique across projects.
    #[validate(length(min = 1, max = 80, message = "name must be 1 to 80 characters"))]
    pub name: String,
}

impl NewProject {
    /// Build an input from a raw name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
        }
    }
}

/// Input of [`AddTask`].
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTask {
    /// Short description of the work.
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: String,
}

impl NewTask {
    /// Build an input from a raw title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_owned(),
        }
    }
}

/// Output of [`CountTasks`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    /// Number of tasks in the project.
    pub count: i64,
    /// When the most recent task was created.
    pub latest_created_at: Option<DateTime<Utc>>,
}

/// Record a failed query as an error and log the cause.
fn query_failed(error: &DbError) -> ValidationError {
    tracing::error!(error = %error, "Query failed");
    ValidationError::new("the request could not be completed")
}

/// Record a violation of `constraint` against `member`.
///
/// Clears the success message set during the run, since the commit did not
/// go through. Violations of other constraints are left to propagate.
fn absorb_violation(
    status: &mut Status,
    violation: Option<ConstraintViolation>,
    constraint: &str,
    member: &str,
) {
    if let Some(violation) = violation.filter(|v| v.is(constraint)) {
        status.add_error(violation.for_member(member));
        status.set_message("");
    }
}

/// Creates a project.
#[derive(Debug)]
pub struct CreateProject {
    status: Status,
    uow: PgUnitOfWork,
}

impl CreateProject {
    /// Bind the action to the unit of work it writes through.
    pub fn new(uow: &PgUnitOfWork) -> Self {
        Self {
            status: Status::new(),
            uow: uow.clone(),
        }
    }

    async fn insert(&self, id: ProjectId, name: &str) -> Result<(), DbError> {
        let mut tx = self.uow.transaction().await?;
        sqlx::query("INSERT INTO projects (id, name) VALUES ($1, $2)")
            .bind(id.into_inner())
            .bind(name)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

impl ActionStatus for CreateProject {
    fn status(&self) -> &Status {
        &self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }
}

impl Action for CreateProject {
    type Input = NewProject;
    type Output = Option<ProjectId>;
    const REQUIRES_WRITE: bool = true;

    async fn run(&mut self, input: NewProject) -> Option<ProjectId> {
        let input = input.normalized();
        if self.validate_model_failed(&input) {
            return None;
        }

        let id = ProjectId::new();
        if let Err(e) = self.insert(id, &input.name).await {
            return self.return_error(query_failed(&e));
        }

        self.status
            .set_message(format!("Project {} created.", input.name));
        Some(id)
    }

    async fn handle_commit_fault(&mut self, fault: &CommitFault) {
        absorb_violation(
            &mut self.status,
            constraint_violation(fault),
            PROJECT_NAME_KEY,
            "name",
        );
    }
}

/// Adds a task to a project.
#[derive(Debug)]
pub struct AddTask {
    status: Status,
    uow: PgUnitOfWork,
}

impl AddTask {
    /// Bind the action to the unit of work it writes through.
    pub fn new(uow: &PgUnitOfWork) -> Self {
        Self {
            status: Status::new(),
            uow: uow.clone(),
        }
    }

    async fn insert(&self, project_id: ProjectId, title: &str) -> Result<(), DbError> {
        let mut tx = self.uow.transaction().await?;
        sqlx::query("INSERT INTO tasks (id, project_id, title) VALUES ($1, $2, $3)")
            .bind(Uuid::now_v7())
            .bind(project_id.into_inner())
            .bind(title)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

impl ActionStatus for AddTask {
    fn status(&self) -> &Status {
        &self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }
}

impl Action for AddTask {
    type Input = InProject<NewTask>;
    type Output = ();
    const REQUIRES_WRITE: bool = true;

    async fn run(&mut self, input: InProject<NewTask>) {
        let (project_id, task) = input.into_parts();
        let task = task.normalized();
        if self.validate_model_failed(&task) {
            return;
        }

        if let Err(e) = self.insert(project_id, &task.title).await {
            self.status.add_error(query_failed(&e));
            return;
        }

        self.status.set_message("Task added.");
    }

    async fn handle_commit_fault(&mut self, fault: &CommitFault) {
        absorb_violation(
            &mut self.status,
            constraint_violation(fault),
            TASK_PROJECT_FKEY,
            "project_id",
        );
    }
}

/// Summarizes a project's tasks. Read-only.
#[derive(Debug)]
pub struct CountTasks {
    status: Status,
    uow: PgUnitOfWork,
}

impl CountTasks {
    /// Bind the action to the unit of work it reads through.
    pub fn new(uow: &PgUnitOfWork) -> Self {
        Self {
            status: Status::new(),
            uow: uow.clone(),
        }
    }

    async fn query(&self, project_id: ProjectId) -> Result<Option<TaskSummary>, DbError> {
        let mut tx = self.uow.transaction().await?;
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1)")
                .bind(project_id.into_inner())
                .fetch_one(&mut **tx)
                .await?;
        if !exists {
            return Ok(None);
        }

        let (count, latest_created_at): (i64, Option<DateTime<Utc>>) =
            sqlx::query_as("SELECT COUNT(*), MAX(created_at) FROM tasks WHERE project_id = $1")
                .bind(project_id.into_inner())
                .fetch_one(&mut **tx)
                .await?;
        Ok(Some(TaskSummary {
            count,
            latest_created_at,
        }))
    }
}

impl ActionStatus for CountTasks {
    fn status(&self) -> &Status {
        &self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }
}

impl Action for CountTasks {
    type Input = InProject<()>;
    type Output = TaskSummary;

    async fn run(&mut self, input: InProject<()>) -> TaskSummary {
        match self.query(input.project_id).await {
            Ok(Some(summary)) => summary,
            Ok(None) => self.return_error(ValidationError::for_member(
                "project_id",
                format!("project {} does not exist", input.project_id),
            )),
            Err(e) => self.return_error(query_failed(&e)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use bizrunner_core::{DeriveValidator, ModelValidator};
    use bizrunner_db::ViolationKind;

    use super::*;

    #[test]
    fn blank_project_name_is_rejected_after_trimming() {
        let errors = DeriveValidator.validate(&NewProject::named("   ").normalized());
        assert_eq!(
            errors,
            vec![ValidationError::for_member(
                "name",
                "name must be 1 to 80 characters"
            )]
        );
    }

    #[test]
    fn project_name_is_trimmed() {
        let input = NewProject::named("  Apollo ").normalized();
        assert_eq!(input.name, "Apollo");
        assert!(DeriveValidator.validate(&input).is_empty());
    }

    #[test]
    fn overlong_task_title_is_rejected() {
        let errors = DeriveValidator.validate(&NewTask::titled("x".repeat(201)).normalized());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].concerns("title"));
    }

    #[test]
    fn inputs_deserialize_from_json() {
        let project: NewProject = serde_json::from_str(r#"{"name":"Apollo"}"#).unwrap();
        let task: NewTask = serde_json::from_str(r#"{"title":"Ship it"}"#).unwrap();
        assert_eq!(project.name, "Apollo");
        assert_eq!(task.title, "Ship it");
    }

    #[test]
    fn empty_summary_serializes_with_null_timestamp() {
        let json = serde_json::to_value(TaskSummary::default()).unwrap();
        assert_eq!(json["count"], 0);
        assert!(json["latest_created_at"].is_null());
    }

    fn violation(kind: ViolationKind, constraint: &str) -> Option<ConstraintViolation> {
        Some(ConstraintViolation {
            kind,
            constraint: Some(constraint.to_owned()),
            table: Some(String::from("projects")),
        })
    }

    #[test]
    fn duplicate_name_replaces_success_message() {
        let mut status = Status::new();
        status.set_message("Project Apollo created.");

        absorb_violation(
            &mut status,
            violation(ViolationKind::Unique, PROJECT_NAME_KEY),
            PROJECT_NAME_KEY,
            "name",
        );

        assert_eq!(status.message(), "");
        assert_eq!(
            status.errors(),
            &[ValidationError::for_member("name", "name is already taken")]
        );
    }

    #[test]
    fn unrelated_violation_is_left_alone() {
        let mut status = Status::new();
        status.set_message("Task added.");

        absorb_violation(
            &mut status,
            violation(ViolationKind::Check, "tasks_title_not_blank"),
            TASK_PROJECT_FKEY,
            "project_id",
        );
        absorb_violation(&mut status, None, TASK_PROJECT_FKEY, "project_id");

        assert_eq!(status.message(), "Task added.");
        assert!(!status.has_errors());
    }
}
