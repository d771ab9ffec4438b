//! Column-name to accessor registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::observability::{log_event, ValidationEvent, ValidationMetrics};
use crate::validation::{
    AccessorError, ExistenceQuery, ExistenceValidator, FieldAccessor, FieldMetadata,
    FrameworkFault, RequiredFieldValidator, ValidationPipeline, Value,
};

use super::types::{EntityMapping, KeySpec};

/// Read/write functions for the columns of record type `R`.
pub struct AccessorRegistry<R> {
    accessors: HashMap<String, FieldAccessor<R>>,
}

impl<R> Default for AccessorRegistry<R> {
    fn default() -> Self {
        Self {
            accessors: HashMap::new(),
        }
    }
}

impl<R> AccessorRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the functions for `column`, replacing earlier ones.
    pub fn register<F, W>(&mut self, column: &str, read: F, write: W) -> &mut Self
    where
        F: Fn(&R) -> Result<Value, AccessorError> + Send + Sync + 'static,
        W: Fn(&mut R, Value) -> Result<(), AccessorError> + Send + Sync + 'static,
    {
        self.accessors.insert(
            column.to_string(),
            FieldAccessor::new(FieldMetadata::new(column), read, write),
        );
        self
    }

    /// Registers a column that can be read but never defaulted.
    pub fn register_read_only<F>(&mut self, column: &str, read: F) -> &mut Self
    where
        F: Fn(&R) -> Result<Value, AccessorError> + Send + Sync + 'static,
    {
        self.accessors.insert(
            column.to_string(),
            FieldAccessor::read_only(FieldMetadata::new(column), read),
        );
        self
    }

    pub fn contains(&self, column: &str) -> bool {
        self.accessors.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

impl EntityMapping {
    /// Builds the validation pipeline for this entity.
    ///
    /// Accessors are attached in declared order. Every declared column
    /// must have registered functions.
    ///
    /// # Errors
    ///
    /// `FrameworkFault::Mapping` on a malformed mapping, a column without
    /// registered functions, or a probe whose placeholder count differs
    /// from its column count.
    pub fn bind<R>(&self, registry: &AccessorRegistry<R>) -> Result<ValidationPipeline<R>, FrameworkFault> {
        self.bind_with_metrics(registry, Arc::new(ValidationMetrics::new()))
    }

    /// Same as `bind`, reporting into a shared metrics registry.
    pub fn bind_with_metrics<R>(
        &self,
        registry: &AccessorRegistry<R>,
        metrics: Arc<ValidationMetrics>,
    ) -> Result<ValidationPipeline<R>, FrameworkFault> {
        self.validate_structure().map_err(FrameworkFault::Mapping)?;

        let required = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| self.accessor(registry, &f.column))
            .collect::<Result<Vec<_>, _>>()?;

        let mut pipeline = ValidationPipeline::new(RequiredFieldValidator::new(
            self.entity.clone(),
            required,
        ))
        .with_metrics(metrics);

        for key in &self.unique_keys {
            pipeline = pipeline.with_unique_key(self.guard(registry, key)?);
        }
        for key in &self.references {
            pipeline = pipeline.with_reference(self.guard(registry, key)?);
        }

        log_event(
            ValidationEvent::MappingLoaded,
            &[
                ("entity", &self.entity),
                ("fields", &self.fields.len().to_string()),
            ],
        );
        Ok(pipeline)
    }

    fn accessor<R>(
        &self,
        registry: &AccessorRegistry<R>,
        column: &str,
    ) -> Result<FieldAccessor<R>, FrameworkFault> {
        let spec = self.field(column).ok_or_else(|| {
            FrameworkFault::Mapping(format!(
                "entity '{}' does not declare column '{}'",
                self.entity, column
            ))
        })?;
        let template = registry.accessors.get(column).ok_or_else(|| {
            FrameworkFault::Mapping(format!(
                "no accessor registered for column '{}' of entity '{}'",
                column, self.entity
            ))
        })?;
        Ok(template.with_metadata(spec.to_metadata()))
    }

    fn guard<R>(
        &self,
        registry: &AccessorRegistry<R>,
        key: &KeySpec,
    ) -> Result<ExistenceValidator<R>, FrameworkFault> {
        let fields = key
            .columns
            .iter()
            .map(|c| self.accessor(registry, c))
            .collect::<Result<Vec<_>, _>>()?;
        let query = ExistenceQuery::new(key.query.clone(), fields)?;
        Ok(ExistenceValidator::new(query, key.subject.clone()))
    }
}
