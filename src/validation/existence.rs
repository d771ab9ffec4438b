//! Row-existence validation
//!
//! Runs a host-written probe query with the key fields bound positionally
//! and turns "a row came back" into a violation or a pass depending on
//! whether the row must be absent (insert guard) or present (reference
//! guard).
//!
//! Statement and cursor handles live for one call and are closed on every
//! exit path, including when binding or execution fails.

use std::sync::Arc;

use crate::observability::{log_event, ValidationEvent, ValidationMetrics};

use super::accessor::FieldAccessor;
use super::binder::ParameterBinder;
use super::errors::{
    FrameworkFault, ValidationError, ValidationResult, Violations, GENERIC_FIELD_KEY,
};
use super::query::{PreparedQuery, QueryExecutor, RowCursor, Scoped};
use super::value::Value;
use super::Target;

/// What the probe must find for the check to pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistenceRule {
    /// Uniqueness guard: a matching row is a violation
    MustNotExist,
    /// Reference guard: a missing row is a violation
    MustExist,
}

impl ExistenceRule {
    pub fn from_must_not_exist(must_not_exist: bool) -> Self {
        if must_not_exist {
            ExistenceRule::MustNotExist
        } else {
            ExistenceRule::MustExist
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ExistenceRule::MustNotExist => "must_not_exist",
            ExistenceRule::MustExist => "must_exist",
        }
    }
}

/// Probe query text plus the fields bound into its placeholders.
///
/// The placeholder count always equals the field count.
pub struct ExistenceQuery<R> {
    text: String,
    fields: Vec<FieldAccessor<R>>,
}

impl<R> ExistenceQuery<R> {
    /// # Errors
    ///
    /// `FrameworkFault::Mapping` if `fields` is empty or the number of `?`
    /// placeholders in `text` differs from the number of fields.
    pub fn new(text: impl Into<String>, fields: Vec<FieldAccessor<R>>) -> Result<Self, FrameworkFault> {
        let text = text.into();
        if fields.is_empty() {
            return Err(FrameworkFault::Mapping(format!(
                "existence query '{}' has no key fields",
                text
            )));
        }
        let placeholders = count_placeholders(&text);
        if placeholders != fields.len() {
            return Err(FrameworkFault::Mapping(format!(
                "existence query '{}' has {} placeholders for {} fields",
                text,
                placeholders,
                fields.len()
            )));
        }
        Ok(Self { text, fields })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fields(&self) -> &[FieldAccessor<R>] {
        &self.fields
    }
}

/// Checks that a row keyed by a record's fields does or does not exist.
pub struct ExistenceValidator<R> {
    query: ExistenceQuery<R>,
    subject: String,
    metrics: Arc<ValidationMetrics>,
}

impl<R> ExistenceValidator<R> {
    /// `subject` names the row in messages: `"<subject> exists."`.
    pub fn new(query: ExistenceQuery<R>, subject: impl Into<String>) -> Self {
        Self {
            query,
            subject: subject.into(),
            metrics: Arc::new(ValidationMetrics::new()),
        }
    }

    /// Report into a shared metrics registry
    pub fn with_metrics(mut self, metrics: Arc<ValidationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn query(&self) -> &ExistenceQuery<R> {
        &self.query
    }

    pub fn metrics(&self) -> &Arc<ValidationMetrics> {
        &self.metrics
    }

    /// Column names of the key fields, in binding order
    pub fn key_columns(&self) -> impl Iterator<Item = &str> {
        self.query.fields.iter().map(|f| f.column())
    }

    /// True when any key field is generated by the store
    pub fn has_auto_generated_key(&self) -> bool {
        self.query.fields.iter().any(|f| f.is_auto_generated())
    }

    /// `"generic"` for composite keys, the sole column name otherwise
    pub fn field_key(&self) -> &str {
        match self.query.fields.as_slice() {
            [single] => single.column(),
            _ => GENERIC_FIELD_KEY,
        }
    }

    /// Probes for the row keyed by `record`'s key fields.
    ///
    /// Succeeds without querying when any key field is auto-generated.
    pub fn validate_existence<E: QueryExecutor>(
        &self,
        executor: &mut E,
        record: &R,
        rule: ExistenceRule,
    ) -> ValidationResult {
        let outcome = self.check_record(executor, record, rule);
        super::conclude(
            Target::Subject(&self.subject),
            rule.as_str(),
            &self.metrics,
            outcome,
        )
    }

    /// Probes with key values the caller already holds.
    ///
    /// Values bind in key-field order. No auto-generated skip applies here.
    ///
    /// # Errors
    ///
    /// `FrameworkFault::KeyArity` if `values.len()` differs from the key
    /// field count.
    pub fn validate_key_values<E: QueryExecutor>(
        &self,
        executor: &mut E,
        values: &[Value],
        rule: ExistenceRule,
    ) -> ValidationResult {
        let outcome = self.check_values(executor, values, rule);
        super::conclude(
            Target::Subject(&self.subject),
            rule.as_str(),
            &self.metrics,
            outcome,
        )
    }

    pub(crate) fn check_record<E: QueryExecutor>(
        &self,
        executor: &mut E,
        record: &R,
        rule: ExistenceRule,
    ) -> Result<Violations, FrameworkFault> {
        if self.has_auto_generated_key() {
            self.skip("auto_generated_key", None);
            return Ok(Violations::new());
        }

        let exists = self.probe(executor, |statement| {
            ParameterBinder::bind_fields(&self.query.fields, record, statement)
        })?;
        Ok(self.judge(exists, rule))
    }

    /// Reads the key fields of `record` in binding order.
    pub(crate) fn read_key(&self, record: &R) -> Result<Vec<Value>, FrameworkFault> {
        self.query
            .fields
            .iter()
            .map(|field| {
                field.read(record).map_err(|source| {
                    log_event(
                        ValidationEvent::AccessorFault,
                        &[
                            ("column", field.column()),
                            ("reason", &source.to_string()),
                            ("subject", &self.subject),
                        ],
                    );
                    FrameworkFault::Accessor {
                        column: field.column().to_string(),
                        source,
                    }
                })
            })
            .collect()
    }

    /// Records an existence check that was not run.
    pub(crate) fn skip(&self, reason: &str, column: Option<&str>) {
        self.metrics.increment_existence_skips();
        match column {
            Some(column) => log_event(
                ValidationEvent::ExistenceCheckSkipped,
                &[("column", column), ("reason", reason), ("subject", &self.subject)],
            ),
            None => log_event(
                ValidationEvent::ExistenceCheckSkipped,
                &[("reason", reason), ("subject", &self.subject)],
            ),
        }
    }

    pub(crate) fn check_values<E: QueryExecutor>(
        &self,
        executor: &mut E,
        values: &[Value],
        rule: ExistenceRule,
    ) -> Result<Violations, FrameworkFault> {
        if values.len() != self.query.fields.len() {
            return Err(FrameworkFault::KeyArity {
                expected: self.query.fields.len(),
                actual: values.len(),
            });
        }

        let exists = self.probe(executor, |statement| {
            ParameterBinder::bind_values(values, statement)
        })?;
        Ok(self.judge(exists, rule))
    }

    fn probe<E, B>(&self, executor: &mut E, bind: B) -> Result<bool, FrameworkFault>
    where
        E: QueryExecutor,
        B: FnOnce(&mut E::Query) -> Result<usize, FrameworkFault>,
    {
        self.metrics.increment_existence_checks();

        let result = (|| -> Result<bool, FrameworkFault> {
            let mut statement =
                Scoped::new(executor.prepare(&self.query.text)?, "statement", &self.metrics);
            bind(statement.get_mut())?;

            let mut cursor =
                Scoped::new(statement.get_mut().execute()?, "cursor", &self.metrics);
            let exists = cursor.get_mut().has_next()?;
            Ok(exists)
        })();

        if let Err(ref fault) = result {
            log_event(
                ValidationEvent::ExistenceCheckFailed,
                &[("reason", &fault.to_string()), ("subject", &self.subject)],
            );
        }
        result
    }

    fn judge(&self, exists: bool, rule: ExistenceRule) -> Violations {
        let mut violations = Violations::new();
        match (rule, exists) {
            (ExistenceRule::MustNotExist, true) => {
                violations.add(ValidationError::row_exists(self.field_key(), &self.subject));
            }
            (ExistenceRule::MustExist, false) => {
                violations.add(ValidationError::row_missing(self.field_key(), &self.subject));
            }
            _ => {}
        }
        violations
    }
}

/// Counts `?` placeholders outside single- and double-quoted literals.
pub fn count_placeholders(text: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '?' => count += 1,
                _ => {}
            },
        }
    }
    count
}
