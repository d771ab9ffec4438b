//! Validation error types
//!
//! Two families, kept apart so callers can tell "fix your input" from
//! "the system is broken":
//!
//! - Violations (REJECT): required field missing, row exists, row missing.
//!   Always reported as an ordered, exhaustive collection.
//! - Framework faults (FATAL): accessor, binding and query failures.
//!   These abort the current validation call.
//!
//! Error codes:
//! - DM_FIELD_REQUIRED (REJECT)
//! - DM_ROW_EXISTS (REJECT)
//! - DM_ROW_MISSING (REJECT)
//! - DM_VALIDATION_FAILED (REJECT)
//! - DM_ACCESSOR_FAILED (FATAL)
//! - DM_QUERY_FAILED (FATAL)
//! - DM_BINDING_FAILED (FATAL)
//! - DM_KEY_ARITY_MISMATCH (FATAL)
//! - DM_MAPPING_INVALID (FATAL)

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::accessor::AccessorError;
use super::query::QueryFailure;

/// Field key used when a violation spans several fields (composite keys).
pub const GENERIC_FIELD_KEY: &str = "generic";

/// Message shown to end users in place of a framework fault's internal cause.
pub const FAULT_USER_MESSAGE: &str = "Unable to validate the request right now, please try again.";

/// Severity levels for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Caller input rejected, correctable by the caller
    Reject,
    /// Internal fault, not correctable by the caller
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Reject => write!(f, "REJECT"),
            ErrorSeverity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Error codes for every failure the validators can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Required field is empty and no default could be applied
    DmFieldRequired,
    /// Row exists where it must not
    DmRowExists,
    /// Row is missing where it must exist
    DmRowMissing,
    /// One or more violations were collected
    DmValidationFailed,
    /// Field accessor failed to read or write
    DmAccessorFailed,
    /// Query could not be prepared, executed or read
    DmQueryFailed,
    /// Parameter could not be bound to its placeholder
    DmBindingFailed,
    /// Explicit key values do not match the key field count
    DmKeyArityMismatch,
    /// Declarative mapping is malformed or inconsistent
    DmMappingInvalid,
}

impl ErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::DmFieldRequired => "DM_FIELD_REQUIRED",
            ErrorCode::DmRowExists => "DM_ROW_EXISTS",
            ErrorCode::DmRowMissing => "DM_ROW_MISSING",
            ErrorCode::DmValidationFailed => "DM_VALIDATION_FAILED",
            ErrorCode::DmAccessorFailed => "DM_ACCESSOR_FAILED",
            ErrorCode::DmQueryFailed => "DM_QUERY_FAILED",
            ErrorCode::DmBindingFailed => "DM_BINDING_FAILED",
            ErrorCode::DmKeyArityMismatch => "DM_KEY_ARITY_MISMATCH",
            ErrorCode::DmMappingInvalid => "DM_MAPPING_INVALID",
        }
    }

    /// Returns the severity level for this code
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCode::DmFieldRequired
            | ErrorCode::DmRowExists
            | ErrorCode::DmRowMissing
            | ErrorCode::DmValidationFailed => ErrorSeverity::Reject,
            _ => ErrorSeverity::Fatal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single business-rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    field_key: String,
    message: String,
    #[serde(skip)]
    code: ErrorCode,
}

impl ValidationError {
    /// Create a violation with an explicit code
    pub fn new(field_key: impl Into<String>, message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            field_key: field_key.into(),
            message: message.into(),
            code,
        }
    }

    /// `"<DisplayName> required."`
    pub fn required(field_key: impl Into<String>, display_name: &str) -> Self {
        Self::new(
            field_key,
            format!("{} required.", display_name),
            ErrorCode::DmFieldRequired,
        )
    }

    /// `"<subject> exists."`
    pub fn row_exists(field_key: impl Into<String>, subject: &str) -> Self {
        Self::new(field_key, format!("{} exists.", subject), ErrorCode::DmRowExists)
    }

    /// `"<subject> does not exist."`
    pub fn row_missing(field_key: impl Into<String>, subject: &str) -> Self {
        Self::new(
            field_key,
            format!("{} does not exist.", subject),
            ErrorCode::DmRowMissing,
        )
    }

    /// Column name of the offending field, or `"generic"`
    pub fn field_key(&self) -> &str {
        &self.field_key
    }

    /// Message safe to show to end users
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_key, self.message)
    }
}

/// Ordered collection of violations gathered during one validation pass.
///
/// Insertion order is preserved. Field keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations {
    errors: Vec<ValidationError>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a violation
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Append every violation of `other`, keeping its order
    pub fn merge(&mut self, other: Violations) {
        self.errors.extend(other.errors);
    }

    pub fn has_violations(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Returns whether any violation is keyed by `field_key`
    pub fn contains_field(&self, field_key: &str) -> bool {
        self.errors.iter().any(|e| e.field_key == field_key)
    }

    /// Messages recorded against `field_key`, in insertion order
    pub fn for_field<'a>(&'a self, field_key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.errors
            .iter()
            .filter(move |e| e.field_key == field_key)
            .map(|e| e.message.as_str())
    }

    pub fn as_slice(&self) -> &[ValidationError] {
        &self.errors
    }

    /// `Ok(())` when nothing was collected, the full collection otherwise
    pub fn into_result(self) -> ValidationResult {
        if self.has_violations() {
            Err(ValidatorError::Violations(self))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: ", ErrorSeverity::Reject, ErrorCode::DmValidationFailed)?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl From<ValidationError> for Violations {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl Extend<ValidationError> for Violations {
    fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl IntoIterator for Violations {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Unexpected failures that abort a validation call
#[derive(Debug, Error)]
pub enum FrameworkFault {
    #[error("accessor for column '{column}' failed: {source}")]
    Accessor {
        column: String,
        #[source]
        source: AccessorError,
    },

    #[error("query failed: {0}")]
    Query(#[from] QueryFailure),

    #[error("binding parameter {position} failed: {source}")]
    Binding {
        position: usize,
        #[source]
        source: QueryFailure,
    },

    #[error("expected {expected} key values, got {actual}")]
    KeyArity { expected: usize, actual: usize },

    #[error("invalid mapping: {0}")]
    Mapping(String),
}

impl FrameworkFault {
    pub fn code(&self) -> ErrorCode {
        match self {
            FrameworkFault::Accessor { .. } => ErrorCode::DmAccessorFailed,
            FrameworkFault::Query(_) => ErrorCode::DmQueryFailed,
            FrameworkFault::Binding { .. } => ErrorCode::DmBindingFailed,
            FrameworkFault::KeyArity { .. } => ErrorCode::DmKeyArityMismatch,
            FrameworkFault::Mapping(_) => ErrorCode::DmMappingInvalid,
        }
    }
}

/// Outcome of a failed validation call: a violation set or a fault
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error(transparent)]
    Violations(#[from] Violations),

    #[error("framework fault: {0}")]
    Fault(#[from] FrameworkFault),
}

impl ValidatorError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidatorError::Violations(_) => ErrorCode::DmValidationFailed,
            ValidatorError::Fault(fault) => fault.code(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, ValidatorError::Fault(_))
    }

    /// Returns the collected violations, if this is a violation set
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            ValidatorError::Violations(v) => Some(v),
            ValidatorError::Fault(_) => None,
        }
    }

    pub fn into_violations(self) -> Option<Violations> {
        match self {
            ValidatorError::Violations(v) => Some(v),
            ValidatorError::Fault(_) => None,
        }
    }

    pub fn fault(&self) -> Option<&FrameworkFault> {
        match self {
            ValidatorError::Fault(f) => Some(f),
            ValidatorError::Violations(_) => None,
        }
    }

    /// Text safe for end users.
    ///
    /// Violations are listed verbatim, one per line. Faults never expose
    /// their internal cause.
    pub fn user_message(&self) -> String {
        match self {
            ValidatorError::Violations(v) => v
                .iter()
                .map(|e| e.message())
                .collect::<Vec<_>>()
                .join("\n"),
            ValidatorError::Fault(_) => FAULT_USER_MESSAGE.to_string(),
        }
    }
}

/// Result type for validation calls
pub type ValidationResult = Result<(), ValidatorError>;
