//! Validation pipeline for one entity type
//!
//! Combines the required-field pass with uniqueness guards (before insert)
//! and reference guards (before a record is used as a reference). Violations
//! from every step are concatenated in the order the steps ran.

use std::sync::Arc;

use crate::observability::ValidationMetrics;

use super::errors::{FrameworkFault, ValidationResult, Violations};
use super::existence::{ExistenceRule, ExistenceValidator};
use super::query::QueryExecutor;
use super::required::{RequiredFieldValidator, ValidationMode};
use super::value::is_empty;
use super::Target;

/// Validators configured once for an entity type and reused per record.
pub struct ValidationPipeline<R> {
    required: RequiredFieldValidator<R>,
    unique_keys: Vec<ExistenceValidator<R>>,
    references: Vec<ExistenceValidator<R>>,
    metrics: Arc<ValidationMetrics>,
}

impl<R> ValidationPipeline<R> {
    pub fn new(required: RequiredFieldValidator<R>) -> Self {
        let metrics = Arc::clone(required.metrics());
        Self {
            required,
            unique_keys: Vec::new(),
            references: Vec::new(),
            metrics,
        }
    }

    /// Adds a guard that must find no row before insert.
    pub fn with_unique_key(mut self, guard: ExistenceValidator<R>) -> Self {
        self.unique_keys
            .push(guard.with_metrics(Arc::clone(&self.metrics)));
        self
    }

    /// Adds a guard that must find a row for `validate_reference`.
    pub fn with_reference(mut self, guard: ExistenceValidator<R>) -> Self {
        self.references
            .push(guard.with_metrics(Arc::clone(&self.metrics)));
        self
    }

    /// Report every step into `metrics`.
    pub fn with_metrics(self, metrics: Arc<ValidationMetrics>) -> Self {
        Self {
            required: self.required.with_metrics(Arc::clone(&metrics)),
            unique_keys: self
                .unique_keys
                .into_iter()
                .map(|g| g.with_metrics(Arc::clone(&metrics)))
                .collect(),
            references: self
                .references
                .into_iter()
                .map(|g| g.with_metrics(Arc::clone(&metrics)))
                .collect(),
            metrics,
        }
    }

    pub fn entity(&self) -> &str {
        self.required.entity()
    }

    pub fn required(&self) -> &RequiredFieldValidator<R> {
        &self.required
    }

    pub fn unique_keys(&self) -> &[ExistenceValidator<R>] {
        &self.unique_keys
    }

    pub fn references(&self) -> &[ExistenceValidator<R>] {
        &self.references
    }

    pub fn metrics(&self) -> &Arc<ValidationMetrics> {
        &self.metrics
    }

    /// Required-field pass over every field, auto-generated ones included.
    pub fn validate_fields(&self, record: &mut R) -> ValidationResult {
        let outcome = self.required.collect(record, ValidationMode::AllFields);
        super::conclude(
            Target::Entity(self.entity()),
            "validate_fields",
            &self.metrics,
            outcome,
        )
    }

    /// Validates a record about to be inserted.
    ///
    /// Runs the required-field pass without touching auto-generated fields,
    /// then every uniqueness guard. A guard is skipped when one of its key
    /// columns already has a violation or holds an empty value, so empty
    /// values are never bound.
    pub fn validate_for_insert<E: QueryExecutor>(
        &self,
        executor: &mut E,
        record: &mut R,
    ) -> ValidationResult {
        let outcome = self.collect_for_insert(executor, record);
        super::conclude(
            Target::Entity(self.entity()),
            "validate_for_insert",
            &self.metrics,
            outcome,
        )
    }

    /// Validates that every reference guard finds its row.
    ///
    /// A guard whose key values are all empty is skipped: a null foreign
    /// key references nothing.
    pub fn validate_reference<E: QueryExecutor>(
        &self,
        executor: &mut E,
        record: &R,
    ) -> ValidationResult {
        let outcome = self.collect_references(executor, record);
        super::conclude(
            Target::Entity(self.entity()),
            "validate_reference",
            &self.metrics,
            outcome,
        )
    }

    fn collect_for_insert<E: QueryExecutor>(
        &self,
        executor: &mut E,
        record: &mut R,
    ) -> Result<Violations, FrameworkFault> {
        let mut violations = self
            .required
            .collect(record, ValidationMode::SkipAutoGenerated)?;

        for guard in &self.unique_keys {
            if guard.has_auto_generated_key() {
                let found = guard.check_record(executor, record, ExistenceRule::MustNotExist)?;
                violations.merge(found);
                continue;
            }
            if let Some(column) = guard.key_columns().find(|c| violations.contains_field(c)) {
                guard.skip("invalid_key", Some(column));
                continue;
            }

            let key = guard.read_key(record)?;
            if let Some(column) = guard
                .key_columns()
                .zip(&key)
                .find_map(|(column, value)| is_empty(value).then_some(column))
            {
                guard.skip("empty_key", Some(column));
                continue;
            }
            let found = guard.check_values(executor, &key, ExistenceRule::MustNotExist)?;
            violations.merge(found);
        }

        Ok(violations)
    }

    fn collect_references<E: QueryExecutor>(
        &self,
        executor: &mut E,
        record: &R,
    ) -> Result<Violations, FrameworkFault> {
        let mut violations = Violations::new();
        for guard in &self.references {
            if guard.has_auto_generated_key() {
                let found = guard.check_record(executor, record, ExistenceRule::MustExist)?;
                violations.merge(found);
                continue;
            }

            let key = guard.read_key(record)?;
            if key.iter().all(is_empty) {
                guard.skip("null_reference", None);
                continue;
            }
            let found = guard.check_values(executor, &key, ExistenceRule::MustExist)?;
            violations.merge(found);
        }
        Ok(violations)
    }
}
