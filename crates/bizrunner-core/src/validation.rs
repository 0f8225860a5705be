//! Validation capability and the error helpers every action gets.
//!
//! [`ModelValidator`] is the seam to whatever validation engine checks
//! structured input. [`DeriveValidator`] adapts the `validator` crate's
//! derive macros to it, flattening nested errors into member paths.
//!
//! [`ActionErrors`] is blanket-implemented for every [`ActionStatus`], so
//! action code can write guard clauses like:
//!
//! ```ignore
//! if self.validate_model_failed(&input) {
//!     return Output::default();
//! }
//! ```

use bizrunner_types::ValidationError;
use validator::ValidationErrorsKind;

use crate::action::ActionStatus;
use crate::status::Status;

/// Field key `validator` uses for struct-level (schema) errors.
const SCHEMA_FIELD: &str = "__all__";

/// Structural validation of a model.
///
/// Implementations must return errors in a stable order for a given model.
pub trait ModelValidator<M: ?Sized> {
    /// Validate `model`, returning every error found (empty when valid).
    fn validate(&self, model: &M) -> Vec<ValidationError>;
}

/// [`ModelValidator`] backed by `#[derive(validator::Validate)]`.
///
/// Nested structs become dotted paths (`owner.email`), list items become
/// indexed paths (`tags[1].label`), and struct-level errors carry no member.
/// Errors are ordered by member path; errors on the same member keep the
/// order the rules were declared in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeriveValidator;

impl<M> ModelValidator<M> for DeriveValidator
where
    M: validator::Validate + ?Sized,
{
    fn validate(&self, model: &M) -> Vec<ValidationError> {
        match model.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => {
                let mut flat = Vec::new();
                flatten(&errors, "", &mut flat);
                flat.sort_by(|a, b| a.0.cmp(&b.0));
                flat.into_iter().map(|(_, error)| error).collect()
            }
        }
    }
}

fn flatten(
    errors: &validator::ValidationErrors,
    prefix: &str,
    out: &mut Vec<(String, ValidationError)>,
) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        let path = if field == SCHEMA_FIELD {
            prefix.to_owned()
        } else if prefix.is_empty() {
            field
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    out.push((path.clone(), convert(&path, error)));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

fn convert(path: &str, error: &validator::ValidationError) -> ValidationError {
    let subject = if path.is_empty() { "input" } else { path };
    let message = error.message.as_ref().map_or_else(
        || format!("{subject} is invalid ({})", error.code),
        ToString::to_string,
    );

    if path.is_empty() {
        ValidationError::new(message)
    } else {
        ValidationError::for_member(path, message)
    }
}

/// Error-recording helpers available on every action.
pub trait ActionErrors: ActionStatus {
    /// Run `validator` against `model` and record everything it reports.
    ///
    /// Returns whether the status now has errors, including errors recorded
    /// before this call.
    fn validate_failed<M, V>(&mut self, validator: &V, model: &M) -> bool
    where
        M: ?Sized,
        V: ModelValidator<M> + ?Sized,
    {
        let errors = validator.validate(model);
        if !errors.is_empty() {
            tracing::debug!(count = errors.len(), "Model validation failed");
        }
        self.status_mut().add_errors(errors);
        self.has_errors()
    }

    /// [`validate_failed`](Self::validate_failed) with [`DeriveValidator`].
    fn validate_model_failed<M>(&mut self, model: &M) -> bool
    where
        M: validator::Validate + ?Sized,
    {
        self.validate_failed(&DeriveValidator, model)
    }

    /// Record `error` and return `T::default()`.
    ///
    /// Lets action code fail and produce a type-correct placeholder in one
    /// expression: `return self.return_error(ValidationError::new(..));`
    fn return_error<T: Default>(&mut self, error: ValidationError) -> T {
        self.status_mut().add_error(error);
        T::default()
    }

    /// Copy `other`'s errors into this status if it has any.
    ///
    /// Returns `true` when errors were copied. An error-free `other` leaves
    /// this status untouched and returns `false`.
    fn inherit_status_failed(&mut self, other: &Status) -> bool {
        if !other.has_errors() {
            return false;
        }
        self.status_mut().add_errors(other.errors().iter().cloned());
        true
    }
}

impl<A: ActionStatus + ?Sized> ActionErrors for A {}
