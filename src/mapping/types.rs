//! Mapping file types
//!
//! ```json
//! {
//!   "entity": "user",
//!   "fields": [
//!     {"column": "id", "auto_generated": true},
//!     {"column": "email", "display_name": "Email"},
//!     {"column": "status", "default": "active"},
//!     {"column": "parentId", "required": false}
//!   ],
//!   "unique_keys": [
//!     {"subject": "Email", "query": "SELECT 1 FROM users WHERE email = ?", "columns": ["email"]}
//!   ],
//!   "references": [
//!     {"subject": "Parent", "query": "SELECT 1 FROM users WHERE id = ?", "columns": ["parentId"]}
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::validation::{FieldMetadata, FrameworkFault, Value};

fn default_required() -> bool {
    true
}

/// One mapped column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub column: String,
    /// Generated by the store; skipped before insert
    #[serde(default)]
    pub auto_generated: bool,
    /// Whether the required-field pass visits this column
    #[serde(default = "default_required")]
    pub required: bool,
    /// Written into the record when the field is empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Name used in messages; derived from the column when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl FieldSpec {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            auto_generated: false,
            required: true,
            default: None,
            display_name: None,
        }
    }

    pub fn to_metadata(&self) -> FieldMetadata {
        let mut meta = FieldMetadata::new(self.column.clone());
        if self.auto_generated {
            meta = meta.auto_generated();
        }
        if let Some(ref default) = self.default {
            meta = meta.with_default(default.clone());
        }
        if let Some(ref name) = self.display_name {
            meta = meta.with_display_name(name.clone());
        }
        meta
    }
}

/// An existence probe over one or more mapped columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Names the row in messages: `"<subject> exists."`
    pub subject: String,
    /// Probe with one `?` per column
    pub query: String,
    /// Columns bound into the placeholders, in order
    pub columns: Vec<String>,
}

/// Complete mapping for one entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub entity: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_keys: Vec<KeySpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<KeySpec>,
}

impl EntityMapping {
    pub fn new(entity: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            entity: entity.into(),
            fields,
            unique_keys: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Parses a mapping from JSON and checks its structure.
    pub fn from_json(content: &str) -> Result<Self, FrameworkFault> {
        let mapping: EntityMapping = serde_json::from_str(content)
            .map_err(|e| FrameworkFault::Mapping(format!("invalid JSON: {}", e)))?;
        mapping.validate_structure().map_err(FrameworkFault::Mapping)?;
        Ok(mapping)
    }

    pub fn field(&self, column: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// Validates the mapping itself (not a record).
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.entity.trim().is_empty() {
            return Err("mapping must name its entity".into());
        }
        if self.fields.is_empty() {
            return Err(format!("entity '{}' declares no fields", self.entity));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.column.trim().is_empty() {
                return Err(format!("entity '{}' has a field without a column", self.entity));
            }
            if !seen.insert(field.column.as_str()) {
                return Err(format!(
                    "entity '{}' declares column '{}' twice",
                    self.entity, field.column
                ));
            }
        }

        for key in self.unique_keys.iter().chain(&self.references) {
            if key.subject.trim().is_empty() {
                return Err(format!("entity '{}' has a key without a subject", self.entity));
            }
            if key.columns.is_empty() {
                return Err(format!(
                    "key '{}' of entity '{}' lists no columns",
                    key.subject, self.entity
                ));
            }
            if let Some(missing) = key.columns.iter().find(|c| !seen.contains(c.as_str())) {
                return Err(format!(
                    "key '{}' of entity '{}' uses undeclared column '{}'",
                    key.subject, self.entity, missing
                ));
            }
        }

        Ok(())
    }
}
