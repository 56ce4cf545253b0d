//! Collaborator traits for reaching a geodatabase and its host application.
//!
//! The core never talks to a database driver, a catalog layer, or a map directly. It
//! consumes these traits instead, so that any data-access API (or an offline snapshot)
//! can stand behind them. Implementations report failures as [`anyhow::Error`]; the
//! core downgrades them into its own error taxonomy.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::kinds::DatasetKind;

/// Value constraint attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainDefinition {
    /// A list of legal `code -> description` pairs.
    CodedValue {
        /// Domain name
        name: String,
        /// Ordered code/description pairs
        values: Vec<(String, String)>,
    },
    /// A numeric range.
    Range {
        /// Domain name
        name: String,
        /// Lower bound, rendered as text
        min: String,
        /// Upper bound, rendered as text
        max: String,
    },
}

impl DomainDefinition {
    /// Returns the domain name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            DomainDefinition::CodedValue { name, .. } | DomainDefinition::Range { name, .. } => {
                name
            },
        }
    }
}

/// Schema of one field as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Field alias, if any
    #[serde(default)]
    pub alias: Option<String>,
    /// Declared type (e.g., "String", "Integer", "Geometry")
    pub field_type: String,
    /// Declared length in bytes
    #[serde(default)]
    pub length: i32,
    /// Whether the field accepts nulls
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Whether the field is editable
    #[serde(default = "default_true")]
    pub editable: bool,
    /// Attached domain
    #[serde(default)]
    pub domain: Option<DomainDefinition>,
    /// Default value, rendered as text
    #[serde(default)]
    pub default_value: Option<String>,
}

fn default_true() -> bool {
    true
}

impl FieldDefinition {
    /// Creates a nullable, editable field without domain or default.
    #[must_use]
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            field_type: field_type.into(),
            length: 0,
            nullable: true,
            editable: true,
            domain: None,
            default_value: None,
        }
    }
}

/// A dataset definition obtained without opening the dataset for row access.
///
/// Each accessor may fail independently; a failing accessor only costs the property
/// it was asked for, or the whole item when the core cannot do without it.
pub trait Definition: Send + Sync {
    /// Fully qualified name (e.g., `GIS.OWNER.ROADS`).
    fn name(&self) -> Result<String>;

    /// Alias name, if any.
    fn alias_name(&self) -> Result<Option<String>>;

    /// Raw shape type string (feature classes only).
    fn shape_type(&self) -> Result<Option<String>>;

    /// Spatial reference display name.
    fn spatial_reference(&self) -> Result<Option<String>>;

    /// Field schema (feature classes and tables only).
    fn fields(&self) -> Result<Vec<FieldDefinition>>;

    /// Origin and destination class names (relationship classes only).
    fn relationship_endpoints(&self) -> Result<Option<(String, String)>>;
}

/// An open, connection-scoped session against one geodatabase.
#[async_trait]
pub trait GeodatabaseSession: Send + Sync {
    /// Lists every definition of the given kind.
    async fn list_definitions(&self, kind: DatasetKind) -> Result<Vec<Box<dyn Definition>>>;

    /// Fetches the definition of exactly one named object.
    async fn get_definition(&self, kind: DatasetKind, name: &str) -> Result<Box<dyn Definition>>;

    /// Opens the named dataset and asks whether archiving is enabled on it.
    async fn is_archived(&self, name: &str) -> Result<bool>;
}

/// Opens sessions from connection files.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Opens a session for the connection file at `connection_path`.
    async fn open(&self, connection_path: &Path) -> Result<Box<dyn GeodatabaseSession>>;
}

/// Source of descriptive metadata documents for catalog objects.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Returns the metadata XML of `qualified_name`, or `None` when the object has none.
    async fn metadata_xml(
        &self,
        connection_path: &Path,
        qualified_name: &str,
    ) -> Result<Option<String>>;
}

/// A database item registered with the host's project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectItem {
    /// Display name of the item
    pub name: String,
    /// Filesystem path of the item
    pub path: PathBuf,
}

/// The host project's list of registered database items.
#[async_trait]
pub trait ProjectCatalog: Send + Sync {
    /// Lists the project's database items.
    async fn database_items(&self) -> Result<Vec<ProjectItem>>;
}

#[async_trait]
impl ProjectCatalog for Vec<ProjectItem> {
    async fn database_items(&self) -> Result<Vec<ProjectItem>> {
        Ok(self.clone())
    }
}

/// Map that datasets can be added to.
#[async_trait]
pub trait MapSink: Send + Sync {
    /// Materializes a feature layer for the dataset at `uri`.
    async fn add_layer(&self, uri: &str) -> Result<()>;

    /// Materializes a standalone table for the dataset at `uri`.
    async fn add_standalone_table(&self, uri: &str) -> Result<()>;
}
