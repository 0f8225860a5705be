//! Field-attributable error values recorded by actions.
//!
//! A [`ValidationError`] is data, not a control-flow signal: validation
//! failures and business-rule failures share this shape and accumulate in an
//! action's status. Infrastructure faults are modelled elsewhere.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One validation or business-rule error.
///
/// `members` names the input members the error is attributed to, using
/// dotted paths for nested structs (`address.city`) and bracketed indices
/// for list items (`items[2].name`). An empty list means the error applies
/// to the input as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ValidationError {
    /// Member paths this error is attributed to.
    pub members: Vec<String>,
    /// Human-readable error message.
    pub message: String,
}

impl ValidationError {
    /// Create an error that is not attributed to any member.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            members: Vec::new(),
            message: message.into(),
        }
    }

    /// Create an error attributed to a single member.
    pub fn for_member(member: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            members: vec![member.into()],
            message: message.into(),
        }
    }

    /// Create an error attributed to several members at once.
    pub fn for_members<I, S>(members: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Whether this error names the given member path.
    pub fn concerns(&self, member: &str) -> bool {
        self.members.iter().any(|m| m == member)
    }
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.members.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.members.join(", "), self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_member_paths() {
        let err = ValidationError::for_members(["start", "end"], "range is inverted");
        assert_eq!(err.to_string(), "start, end: range is inverted");
        assert_eq!(ValidationError::new("boom").to_string(), "boom");
    }

    #[test]
    fn concerns_matches_exact_paths_only() {
        let err = ValidationError::for_member("address.city", "required");
        assert!(err.concerns("address.city"));
        assert!(!err.concerns("address"));
    }
}
