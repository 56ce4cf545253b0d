//! Offline geodatabase sessions backed by JSON schema snapshots.
//!
//! A snapshot records the schema-level view of one geodatabase: its feature datasets,
//! feature classes, tables and relationship classes, with field lists, archive status
//! and metadata documents. [`SnapshotSessionFactory`] serves a snapshot through the
//! session and metadata collaborator traits, so catalogs can be browsed and cached
//! without a live database.
//!
//! Snapshots are located either explicitly or as a sidecar file next to the connection
//! file (`Prod.sde` -> `Prod.json`).

mod document;
mod factory;

pub use document::{Snapshot, SnapshotDataset};
pub use factory::{SnapshotSessionFactory, SnapshotSource};
