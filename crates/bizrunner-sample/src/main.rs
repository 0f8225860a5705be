//! Sample binary for the bizrunner action framework.
//!
//! Wires configuration, logging, and `PostgreSQL` together and runs the
//! sample project and task actions, each in its own unit of work.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `bizrunner.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Create a project (name from the first CLI argument)
//! 5. Add tasks to it, including one that fails validation
//! 6. Try to create the same project again to show a mapped commit fault
//! 7. Summarize the project's tasks
//!
//! Each action's status is logged as JSON.

mod actions;
mod error;

use std::path::Path;

use bizrunner_core::{
    Action, BizRunnerConfig, InProject, LogFormat, LoggingConfig, Runner, RunnerConfig, UnitOfWork,
};
use bizrunner_db::{PostgresConfig, PostgresPool};
use bizrunner_types::ProjectId;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::actions::{AddTask, CountTasks, CreateProject, NewProject, NewTask};
use crate::error::SampleError;

/// Default config file, relative to the working directory.
const CONFIG_PATH: &str = "bizrunner.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if startup fails or a commit fault is not absorbed by
/// the action that caused it.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("bizrunner-sample starting");

    // 3. Connect and migrate.
    let pool = PostgresPool::connect(&PostgresConfig::from(&config.database)).await?;
    pool.run_migrations().await?;

    let name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("Sample project {}", chrono::Utc::now().format("%Y%m%d%H%M%S")));

    // 4. Create the project.
    let uow = pool.unit_of_work().await?;
    let project_id = run_action(
        CreateProject::new(&uow),
        uow,
        &config.runner,
        NewProject::named(name.clone()),
    )
    .await?;

    let Some(project_id) = project_id else {
        info!(name = %name, "Project was not created, stopping");
        pool.close().await;
        return Ok(());
    };
    info!(%project_id, name = %name, "Project created");

    // 5. Add tasks. The blank title is rejected before anything is written.
    for title in ["Draft the plan", "   ", "Review the plan"] {
        add_task(&pool, &config.runner, project_id, title).await?;
    }

    // 6. Duplicate name: the deferred unique constraint fails at commit and
    //    the action records it against `name`.
    let uow = pool.unit_of_work().await?;
    let duplicate = run_action(
        CreateProject::new(&uow),
        uow,
        &config.runner,
        NewProject::named(name),
    )
    .await?;
    info!(created = duplicate.is_some(), "Duplicate project attempt finished");

    // 7. Summarize.
    let uow = pool.unit_of_work().await?;
    let summary = run_action(
        CountTasks::new(&uow),
        uow.clone(),
        &config.runner,
        InProject::only(project_id),
    )
    .await?;
    uow.rollback().await?;
    info!(
        summary = %serde_json::to_string(&summary)?,
        "Task summary"
    );

    pool.close().await;
    info!("bizrunner-sample finished");
    Ok(())
}

async fn add_task(
    pool: &PostgresPool,
    runner_config: &RunnerConfig,
    project_id: ProjectId,
    title: &str,
) -> Result<(), SampleError> {
    let uow = pool.unit_of_work().await?;
    let input = InProject::new(project_id, NewTask::titled(title));
    run_action(AddTask::new(&uow), uow, runner_config, input).await
}

/// Execute `action` in `uow` and log its final status.
///
/// A unit of work that was not committed (errors recorded, or a read-only
/// action) is rolled back when the last handle is dropped.
async fn run_action<A, U>(
    action: A,
    mut uow: U,
    runner_config: &RunnerConfig,
    input: A::Input,
) -> Result<A::Output, SampleError>
where
    A: Action,
    U: UnitOfWork,
{
    let mut runner = Runner::with_config(action, &mut uow, runner_config.clone());
    let output = runner.execute(input).await?;
    let snapshot = runner.status().snapshot();
    info!(
        action = std::any::type_name::<A>(),
        phase = ?runner.phase(),
        status = %serde_json::to_string(&snapshot)?,
        "Action finished"
    );
    Ok(output)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Load configuration from `bizrunner.yaml`.
///
/// Falls back to defaults (plus environment overrides) when the file does
/// not exist.
fn load_config() -> Result<BizRunnerConfig, SampleError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(BizRunnerConfig::from_file(config_path)?)
    } else {
        let mut config = BizRunnerConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}
