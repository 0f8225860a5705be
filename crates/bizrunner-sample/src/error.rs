//! Error types for the sample binary.
//!
//! [`SampleError`] is the top-level error type that wraps all possible
//! failure modes during startup and action execution.

/// Top-level error for the sample binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: bizrunner_core::ConfigError,
    },

    /// Connecting, migrating, or opening a unit of work failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: bizrunner_db::DbError,
    },

    /// An action's commit failed and the action did not absorb it.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: bizrunner_core::RunnerError,
    },

    /// Rendering a result as JSON failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}
