//! Required-field validation with default substitution
//!
//! Every declared field is visited in order and every violation is
//! collected; the pass never stops at the first empty field. Accessor
//! failures outside default substitution abort the pass as a fault.

use std::sync::Arc;

use crate::observability::{log_event, ValidationEvent, ValidationMetrics};

use super::accessor::FieldAccessor;
use super::errors::{FrameworkFault, ValidationError, ValidationResult, Violations};
use super::value::is_empty;
use super::Target;

/// Which fields a required-field pass visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Visit every declared field
    AllFields,
    /// Leave auto-generated fields untouched (before insert)
    SkipAutoGenerated,
}

impl ValidationMode {
    fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::AllFields => "all_fields",
            ValidationMode::SkipAutoGenerated => "skip_auto_generated",
        }
    }
}

/// Enforces required-ness and default values over an ordered field list.
pub struct RequiredFieldValidator<R> {
    entity: String,
    fields: Vec<FieldAccessor<R>>,
    metrics: Arc<ValidationMetrics>,
}

impl<R> RequiredFieldValidator<R> {
    pub fn new(entity: impl Into<String>, fields: Vec<FieldAccessor<R>>) -> Self {
        Self {
            entity: entity.into(),
            fields,
            metrics: Arc::new(ValidationMetrics::new()),
        }
    }

    /// Report into a shared metrics registry
    pub fn with_metrics(mut self, metrics: Arc<ValidationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn fields(&self) -> &[FieldAccessor<R>] {
        &self.fields
    }

    pub fn metrics(&self) -> &Arc<ValidationMetrics> {
        &self.metrics
    }

    /// Validates `record`, writing declared defaults into empty fields.
    ///
    /// # Errors
    ///
    /// - `ValidatorError::Violations` with one `"<Display Name> required."`
    ///   entry per empty field lacking a usable default, in declaration order
    /// - `ValidatorError::Fault` if an accessor fails to read a field
    pub fn validate(&self, record: &mut R, mode: ValidationMode) -> ValidationResult {
        let outcome = self.collect(record, mode);
        super::conclude(
            Target::Entity(&self.entity),
            mode.as_str(),
            &self.metrics,
            outcome,
        )
    }

    /// Runs the pass and returns the raw violations without reporting.
    pub(crate) fn collect(
        &self,
        record: &mut R,
        mode: ValidationMode,
    ) -> Result<Violations, FrameworkFault> {
        let mut violations = Violations::new();

        for field in &self.fields {
            if mode == ValidationMode::SkipAutoGenerated && field.is_auto_generated() {
                continue;
            }

            let value = field.read(record).map_err(|source| {
                log_event(
                    ValidationEvent::AccessorFault,
                    &[
                        ("column", field.column()),
                        ("entity", &self.entity),
                        ("reason", &source.to_string()),
                    ],
                );
                FrameworkFault::Accessor {
                    column: field.column().to_string(),
                    source,
                }
            })?;

            if !is_empty(&value) {
                continue;
            }

            let meta = field.metadata();
            let defaulted = match meta.default_value() {
                // A failed default write is reported as the field being required.
                Some(default) => field.write(record, default.clone()).is_ok(),
                None => false,
            };

            if !defaulted {
                violations.add(ValidationError::required(meta.column(), meta.display_name()));
            }
        }

        Ok(violations)
    }
}
