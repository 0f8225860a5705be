//! Action contracts, status aggregation, and the commit-gated runner.
//!
//! An *action* is one invocation-scoped unit of domain logic. It records
//! validation and business-rule failures in its own [`Status`] instead of
//! returning them, and a [`Runner`] decides from that status whether the
//! caller's unit of work should be committed.
//!
//! # Modules
//!
//! - [`action`] -- [`Action`] and [`ActionStatus`] contracts, plus the
//!   [`InProject`] input wrapper for project-scoped actions.
//! - [`config`] -- Configuration loading from `bizrunner.yaml`.
//! - [`runner`] -- [`Runner`], which runs an action and conditionally
//!   commits.
//! - [`status`] -- [`Status`], the per-invocation error aggregator.
//! - [`unit_of_work`] -- The [`UnitOfWork`] capability and [`CommitFault`].
//! - [`validation`] -- [`ModelValidator`] and the [`ActionErrors`] helpers.

pub mod action;
pub mod config;
pub mod runner;
pub mod status;
pub mod unit_of_work;
pub mod validation;

pub use action::{Action, ActionStatus, InProject};
pub use config::{BizRunnerConfig, ConfigError, DatabaseConfig, LogFormat, LoggingConfig, RunnerConfig};
pub use runner::{IntoRunner, RunOutcome, RunPhase, Runner, RunnerError};
pub use status::Status;
pub use unit_of_work::{BoxError, CommitFault, UnitOfWork};
pub use validation::{ActionErrors, DeriveValidator, ModelValidator};

pub use bizrunner_types::{ProjectId, StatusSnapshot, ValidationError};
