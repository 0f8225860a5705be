//! The project identifier that scoped actions carry.
//!
//! New IDs use UUID v7, so they sort by creation time.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Identifier of the project a resource-scoped action operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProjectId(pub Uuid);

impl ProjectId {
    /// A fresh, time-ordered project ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The raw [`Uuid`], e.g. for binding into a query.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for ProjectId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ProjectId> for Uuid {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_not_nil() {
        let project = ProjectId::new();
        assert_ne!(project.into_inner(), Uuid::nil());
    }

    #[test]
    fn uuid_round_trips_through_from() {
        let raw = Uuid::now_v7();
        let project = ProjectId::from(raw);
        assert_eq!(Uuid::from(project), raw);
        assert_eq!(project.to_string(), raw.to_string());
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let raw = Uuid::nil();
        let json = serde_json::to_string(&ProjectId(raw)).ok();
        assert_eq!(json.as_deref(), Some("\"00000000-0000-0000-0000-000000000000\""));
    }
}
