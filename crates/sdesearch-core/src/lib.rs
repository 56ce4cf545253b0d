//! `sdesearch-core` is the core library of `sdesearch`: discovery, caching and instant
//! filtering of the datasets held in enterprise geodatabases.
//!
//! This crate includes:
//! - **Connection Registry**: Discovers `.sde` connection files from the project, the
//!   project and profile connection folders, and manual input.
//! - **Catalog Loader**: Enumerates feature datasets, feature classes, tables and
//!   relationship classes of one connection, tolerating partial failures.
//! - **Disk Cache**: One JSON catalog file per connection, replaced atomically.
//! - **Filter Engine**: Synchronous multi-term, multi-scope filtering over a catalog.
//! - **Detail Resolver**: Lazy field schema, metadata and flag enrichment of one entry.
//! - **Search Session**: The panel state tying all of the above together.
//!
//! Database access goes through the collaborator traits of `sdesearch-core-common`.

pub mod cache;
pub mod classify;
pub mod details;
pub mod error;
pub mod filter;
pub mod loader;
pub mod map;
pub mod metadata;
pub mod model;
pub mod panel;
pub mod registry;
pub mod settings;
pub mod utils;

pub use error::{Result, SdeSearchError};
pub use panel::SearchSession;
