//! Per-invocation error and message aggregation.
//!
//! Every action owns exactly one [`Status`]. Validation and business-rule
//! failures are appended to it as [`ValidationError`] values; whether the
//! run failed is always derived from the error list, never stored beside it.

use bizrunner_types::{StatusSnapshot, ValidationError};

/// Error and message aggregator owned by one action instance.
///
/// The error list is append-only from the outside: callers can read it as a
/// slice but cannot edit or remove entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    errors: Vec<ValidationError>,
    message: String,
}

impl Status {
    /// Create an empty status with no errors and an empty message.
    pub const fn new() -> Self {
        Self {
            errors: Vec::new(),
            message: String::new(),
        }
    }

    /// Append one error.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Append every error from `errors`, preserving their order.
    pub fn add_errors<I>(&mut self, errors: I)
    where
        I: IntoIterator<Item = ValidationError>,
    {
        self.errors.extend(errors);
    }

    /// Whether at least one error has been recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Recorded errors in insertion order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Number of recorded errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Human-readable outcome message.
    ///
    /// Informational only. [`has_errors`](Self::has_errors) decides success.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Replace the outcome message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Join every error's display form with `separator`.
    ///
    /// Returns an empty string when there are no errors.
    pub fn error_summary(&self, separator: &str) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Copy the current state into a serializable [`StatusSnapshot`].
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            errors: self.errors.clone(),
            has_errors: self.has_errors(),
            message: self.message.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn new_status_is_clean() {
        let status = Status::new();
        assert!(!status.has_errors());
        assert!(status.errors().is_empty());
        assert_eq!(status.message(), "");
    }

    #[test]
    fn add_errors_preserves_order_and_duplicates() {
        let mut status = Status::new();
        status.add_error(ValidationError::for_member("name", "required"));
        status.add_errors(vec![
            ValidationError::new("first"),
            ValidationError::new("first"),
        ]);

        assert_eq!(status.error_count(), 3);
        assert_eq!(status.errors()[0].members, vec![String::from("name")]);
        assert_eq!(status.errors()[1], status.errors()[2]);
    }

    #[test]
    fn message_is_independent_of_errors() {
        let mut status = Status::new();
        status.set_message("all good");
        assert!(!status.has_errors());
        assert_eq!(status.message(), "all good");
    }

    #[test]
    fn summary_joins_display_forms() {
        let mut status = Status::new();
        assert_eq!(status.error_summary("; "), "");
        status.add_error(ValidationError::for_member("name", "is required"));
        status.add_error(ValidationError::new("quota exceeded"));
        assert_eq!(status.error_summary("; "), "name: is required; quota exceeded");
    }

    #[test]
    fn snapshot_serializes_derived_flag() {
        let mut status = Status::new();
        status.add_error(ValidationError::new("nope"));
        status.set_message("failed");

        let json = serde_json::to_value(status.snapshot()).unwrap();
        assert_eq!(json["has_errors"], serde_json::Value::Bool(true));
        assert_eq!(json["message"], "failed");
        assert_eq!(json["errors"][0]["message"], "nope");
    }

    fn arb_error() -> impl Strategy<Value = ValidationError> {
        ("[a-z]{0,6}", "[a-z ]{1,12}").prop_map(|(member, message)| {
            if member.is_empty() {
                ValidationError::new(message)
            } else {
                ValidationError::for_member(member, message)
            }
        })
    }

    #[derive(Debug, Clone)]
    enum Op {
        One(ValidationError),
        Many(Vec<ValidationError>),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            arb_error().prop_map(Op::One),
            prop::collection::vec(arb_error(), 0..4).prop_map(Op::Many),
        ]
    }

    proptest! {
        #[test]
        fn has_errors_tracks_error_list(ops in prop::collection::vec(arb_op(), 0..16)) {
            let mut status = Status::new();
            let mut expected: Vec<ValidationError> = Vec::new();
            prop_assert_eq!(status.has_errors(), !status.errors().is_empty());

            for op in ops {
                match op {
                    Op::One(error) => {
                        expected.push(error.clone());
                        status.add_error(error);
                    }
                    Op::Many(errors) => {
                        expected.extend(errors.iter().cloned());
                        status.add_errors(errors);
                    }
                }
                prop_assert_eq!(status.has_errors(), !status.errors().is_empty());
            }

            prop_assert_eq!(status.errors(), expected.as_slice());
        }
    }
}
