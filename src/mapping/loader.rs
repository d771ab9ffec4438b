//! Mapping loader
//!
//! - One JSON file per entity in the mapping directory
//! - Files load in name order
//! - A malformed file or a duplicate entity fails the whole load

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::observability::{log_event, ValidationEvent};
use crate::validation::FrameworkFault;

use super::types::EntityMapping;

/// Reads entity mappings from disk and keeps them by entity name.
pub struct MappingLoader {
    mapping_dir: PathBuf,
    mappings: HashMap<String, EntityMapping>,
}

impl MappingLoader {
    pub fn new(mapping_dir: &Path) -> Self {
        Self {
            mapping_dir: mapping_dir.to_path_buf(),
            mappings: HashMap::new(),
        }
    }

    pub fn mapping_dir(&self) -> &Path {
        &self.mapping_dir
    }

    /// Loads every `*.json` file in the mapping directory.
    ///
    /// Returns the number of mappings loaded by this call.
    pub fn load_all(&mut self) -> Result<usize, FrameworkFault> {
        let entries = fs::read_dir(&self.mapping_dir).map_err(|e| {
            FrameworkFault::Mapping(format!(
                "failed to read mapping directory '{}': {}",
                self.mapping_dir.display(),
                e
            ))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                FrameworkFault::Mapping(format!(
                    "failed to read entry in '{}': {}",
                    self.mapping_dir.display(),
                    e
                ))
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }
        Ok(paths.len())
    }

    /// Loads and registers a single mapping file.
    pub fn load_file(&mut self, path: &Path) -> Result<&EntityMapping, FrameworkFault> {
        let content = fs::read_to_string(path).map_err(|e| {
            FrameworkFault::Mapping(format!("failed to read '{}': {}", path.display(), e))
        })?;

        let mapping = EntityMapping::from_json(&content).map_err(|e| match e {
            FrameworkFault::Mapping(reason) => {
                FrameworkFault::Mapping(format!("'{}': {}", path.display(), reason))
            }
            other => other,
        })?;

        let entity = mapping.entity.clone();
        self.register(mapping)?;
        self.mappings
            .get(&entity)
            .ok_or_else(|| FrameworkFault::Mapping(format!("entity '{}' not registered", entity)))
    }

    /// Registers a mapping built in code.
    pub fn register(&mut self, mapping: EntityMapping) -> Result<(), FrameworkFault> {
        mapping.validate_structure().map_err(FrameworkFault::Mapping)?;

        if self.mappings.contains_key(&mapping.entity) {
            return Err(FrameworkFault::Mapping(format!(
                "entity '{}' is mapped more than once",
                mapping.entity
            )));
        }

        log_event(ValidationEvent::MappingLoaded, &[("entity", &mapping.entity)]);
        self.mappings.insert(mapping.entity.clone(), mapping);
        Ok(())
    }

    pub fn get(&self, entity: &str) -> Option<&EntityMapping> {
        self.mappings.get(entity)
    }

    /// Entity names, sorted
    pub fn entities(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.mappings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
