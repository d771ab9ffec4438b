//! Declarative entity mappings
//!
//! An entity mapping lists, in order, the columns a record type maps to and
//! the existence probes guarding it. Mappings are plain JSON, one file per
//! entity, loaded once at startup. Hosts pair a mapping with an
//! `AccessorRegistry` holding the read/write functions for each column to
//! obtain a ready-to-use `ValidationPipeline`.

mod loader;
mod registry;
mod types;

pub use loader::MappingLoader;
pub use registry::AccessorRegistry;
pub use types::{EntityMapping, FieldSpec, KeySpec};
