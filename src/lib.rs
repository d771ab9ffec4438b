//! rowguard - field and row-existence validation for records backed by a
//! relational store
//!
//! A data-access layer describes each entity as an ordered list of field
//! accessors plus the probe queries guarding it, then asks a
//! `ValidationPipeline` to check records before inserting them or using them
//! as references. Every violation is collected in one pass; unexpected
//! failures come back separately as framework faults.

pub mod mapping;
pub mod memory;
pub mod observability;
pub mod validation;

pub use mapping::{AccessorRegistry, EntityMapping, MappingLoader};
pub use validation::{
    ExistenceQuery, ExistenceRule, ExistenceValidator, FieldAccessor, FieldMetadata,
    FrameworkFault, QueryExecutor, RequiredFieldValidator, ValidationError, ValidationMode,
    ValidationPipeline, ValidationResult, ValidatorError, Violations,
};
