//! Field accessors
//!
//! A `FieldAccessor` pairs a read function and a write function for one
//! record field with the field's declared metadata. Accessors are built once
//! per entity type and shared read-only between validators.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::value::Value;

/// Failure inside a host-supplied accessor.
///
/// Always an internal fault, never a business-rule violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessorError {
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("field is read-only")]
    ReadOnly,

    #[error("field unavailable: {0}")]
    Unavailable(String),
}

impl AccessorError {
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        AccessorError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Declared metadata for one mapped field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMetadata {
    column: String,
    auto_generated: bool,
    default_value: Option<Value>,
    display_name: String,
}

impl FieldMetadata {
    /// Metadata for a plain column; the display name is derived from it.
    pub fn new(column: impl Into<String>) -> Self {
        let column = column.into();
        let display_name = display_name_for(&column);
        Self {
            column,
            auto_generated: false,
            default_value: None,
            display_name,
        }
    }

    /// Marks the column as generated by the store (identity, sequence).
    pub fn auto_generated(mut self) -> Self {
        self.auto_generated = true;
        self
    }

    /// Declares the value written when the field is empty.
    ///
    /// A `Null` default is the same as no default.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = match value {
            Value::Null => None,
            v => Some(v),
        };
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn is_auto_generated(&self) -> bool {
        self.auto_generated
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

type ReadFn<R> = dyn Fn(&R) -> Result<Value, AccessorError> + Send + Sync;
type WriteFn<R> = dyn Fn(&mut R, Value) -> Result<(), AccessorError> + Send + Sync;

/// Reads and writes one field of a record of type `R`.
pub struct FieldAccessor<R> {
    metadata: Arc<FieldMetadata>,
    read: Arc<ReadFn<R>>,
    write: Arc<WriteFn<R>>,
}

impl<R> FieldAccessor<R> {
    pub fn new<F, W>(metadata: FieldMetadata, read: F, write: W) -> Self
    where
        F: Fn(&R) -> Result<Value, AccessorError> + Send + Sync + 'static,
        W: Fn(&mut R, Value) -> Result<(), AccessorError> + Send + Sync + 'static,
    {
        Self {
            metadata: Arc::new(metadata),
            read: Arc::new(read),
            write: Arc::new(write),
        }
    }

    /// Accessor whose writer always fails with `AccessorError::ReadOnly`.
    pub fn read_only<F>(metadata: FieldMetadata, read: F) -> Self
    where
        F: Fn(&R) -> Result<Value, AccessorError> + Send + Sync + 'static,
    {
        Self::new(metadata, read, |_, _| Err(AccessorError::ReadOnly))
    }

    /// Same read and write functions under different metadata.
    pub fn with_metadata(&self, metadata: FieldMetadata) -> Self {
        Self {
            metadata: Arc::new(metadata),
            read: Arc::clone(&self.read),
            write: Arc::clone(&self.write),
        }
    }

    pub fn metadata(&self) -> &FieldMetadata {
        &self.metadata
    }

    pub fn column(&self) -> &str {
        self.metadata.column()
    }

    pub fn is_auto_generated(&self) -> bool {
        self.metadata.is_auto_generated()
    }

    /// Reads the field's current value. Never mutates the record.
    pub fn read(&self, record: &R) -> Result<Value, AccessorError> {
        (self.read)(record)
    }

    /// Writes exactly this field.
    pub fn write(&self, record: &mut R, value: Value) -> Result<(), AccessorError> {
        (self.write)(record, value)
    }
}

impl<R> Clone for FieldAccessor<R> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
            read: Arc::clone(&self.read),
            write: Arc::clone(&self.write),
        }
    }
}

impl<R> fmt::Debug for FieldAccessor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Derives a human-readable name from a column name.
///
/// Splits on underscores and lower-to-upper case humps, then capitalises
/// each word: `parentId` and `parent_id` both become `Parent Id`.
pub fn display_name_for(column: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in column.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
