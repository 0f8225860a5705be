//! Read-only view of an action's status for diagnostics and UI.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::ValidationError;

/// Point-in-time copy of an action's status.
///
/// Produced after a run so callers (HTTP handlers, dashboards, logs) can
/// report the outcome without holding on to the action itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatusSnapshot {
    /// Errors in the order they were recorded.
    pub errors: Vec<ValidationError>,
    /// Whether `errors` is non-empty at the time of the snapshot.
    pub has_errors: bool,
    /// Human-readable outcome message.
    pub message: String,
}
