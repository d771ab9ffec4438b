//! Validator engine
//!
//! Field-level checks (required fields, default substitution) and row-level
//! checks (uniqueness and reference guards) over records described by an
//! ordered list of field accessors.
//!
//! # Outcomes
//!
//! Every validation call ends in exactly one of:
//! - success
//! - a non-empty, ordered violation list, safe to show to end users
//! - a framework fault, which aborts the call and discards any violations
//!
//! # Concurrency
//!
//! Validators are immutable after construction and `Send + Sync` when the
//! record type allows it. The query executor is borrowed mutably per call
//! and is never stored.

mod accessor;
mod binder;
mod errors;
mod existence;
mod pipeline;
mod query;
mod required;
mod value;

pub use accessor::{display_name_for, AccessorError, FieldAccessor, FieldMetadata};
pub use binder::{ParameterBinder, ParameterSink};
pub use errors::{
    ErrorCode, ErrorSeverity, FrameworkFault, ValidationError, ValidationResult, ValidatorError,
    Violations, FAULT_USER_MESSAGE, GENERIC_FIELD_KEY,
};
pub use existence::{count_placeholders, ExistenceQuery, ExistenceRule, ExistenceValidator};
pub use pipeline::ValidationPipeline;
pub use query::{PreparedQuery, QueryExecutor, QueryFailure, QueryResource, RowCursor};
pub use required::{RequiredFieldValidator, ValidationMode};
pub use value::{is_empty, type_name, Value};

use crate::observability::{log_event, ValidationEvent, ValidationMetrics};

/// What a validation call ran against, as named in its log line
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    /// A whole record type (required pass, pipeline)
    Entity(&'a str),
    /// A single existence guard
    Subject(&'a str),
}

impl<'a> Target<'a> {
    fn log_fields(self, operation: &'a str) -> [(&'static str, &'a str); 2] {
        match self {
            Target::Entity(name) => [("entity", name), ("operation", operation)],
            Target::Subject(name) => [("operation", operation), ("subject", name)],
        }
    }
}

/// Turns a collected outcome into the public result, recording it once.
fn conclude(
    target: Target<'_>,
    operation: &str,
    metrics: &ValidationMetrics,
    outcome: Result<Violations, FrameworkFault>,
) -> ValidationResult {
    let fields = target.log_fields(operation);
    match outcome {
        Ok(violations) if violations.is_empty() => {
            metrics.increment_passes();
            log_event(ValidationEvent::ValidationPassed, &fields);
            Ok(())
        }
        Ok(violations) => {
            metrics.record_rejection(violations.len());
            let count = violations.len().to_string();
            log_event(
                ValidationEvent::ValidationRejected,
                &[fields[0], fields[1], ("violations", count.as_str())],
            );
            Err(ValidatorError::Violations(violations))
        }
        Err(fault) => {
            metrics.increment_faults();
            Err(ValidatorError::Fault(fault))
        }
    }
}
