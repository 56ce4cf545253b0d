//! Common types and traits shared across `sdesearch` crates.
//!
//! This crate provides the collaborator abstractions that are shared between
//! `sdesearch-core` and session implementation crates, preventing circular dependencies.

pub mod kinds;
pub mod session;

// Re-export commonly used types
pub use kinds::DatasetKind;
pub use session::{
    Definition, DomainDefinition, FieldDefinition, GeodatabaseSession, MapSink, MetadataSource,
    ProjectCatalog, ProjectItem, SessionFactory,
};
