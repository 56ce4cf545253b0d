//! Data types describing connections, catalog entries and their details.
//!
//! This module defines the normalized records produced by discovery and loading, and
//! the per-field detail rows produced on demand by the detail resolver.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sdesearch_core_common::{DatasetKind, DomainDefinition, FieldDefinition};
use serde::{Deserialize, Serialize};

use crate::classify::{IconCategory, classify_entry};
use crate::utils::simple_name;

/// Where a connection descriptor was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionOrigin {
    /// Registered as a database item in the current project
    Project,
    /// Found in the project's connections folder
    ProjectFolder,
    /// Found in the user profile's connections folder
    ProfileFolder,
    /// Added by the user, by browsing or typing a path
    Manual,
}

impl ConnectionOrigin {
    /// Returns the label shown in connection listings.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionOrigin::Project => "Project",
            ConnectionOrigin::ProjectFolder => "Project Folder",
            ConnectionOrigin::ProfileFolder => "ArcGIS Pro",
            ConnectionOrigin::Manual => "Manual",
        }
    }
}

/// A database connection file the user can browse.
///
/// The path is the identity key; two descriptors are the same connection when their
/// paths compare equal ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Display name
    pub name: String,
    /// Connection file path
    pub path: PathBuf,
    /// Discovery source
    pub origin: ConnectionOrigin,
}

impl ConnectionDescriptor {
    /// Creates a descriptor named after the file stem of `path`.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>, origin: ConnectionOrigin) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        Self { name, path, origin }
    }

    /// Name shown in pickers; manual connections are marked as such.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.origin {
            ConnectionOrigin::Manual => format!("{}  (manual)", self.name),
            _ => self.name.clone(),
        }
    }

    /// Returns `true` when `path` identifies this connection.
    #[must_use]
    pub fn matches_path(&self, path: &Path) -> bool {
        crate::utils::paths_equal_ignore_case(&self.path, path)
    }
}

/// Descriptive metadata of a catalog entry, populated lazily on first detail view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MetadataBlock {
    /// Whether a metadata document was found
    pub has_metadata: bool,
    /// Abstract
    pub description: String,
    /// Summary
    pub summary: String,
    /// Purpose
    pub purpose: String,
    /// Comma-separated, de-duplicated keywords
    pub tags: String,
    /// Credits
    pub credits: String,
    /// Use limitations
    pub use_constraints: String,
    /// Short text for list display
    pub snippet: String,
    /// The metadata document as fetched
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

/// One dataset-like object discovered in a geodatabase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatasetEntry {
    /// Fully qualified name
    pub name: String,
    /// Name without database/owner qualifiers
    pub simple_name: String,
    /// Alias name
    #[serde(default)]
    pub alias: Option<String>,
    /// Dataset kind
    pub kind: DatasetKind,
    /// Raw shape type (feature classes only)
    #[serde(default)]
    pub geometry_type: Option<String>,
    /// Icon classification
    pub icon: IconCategory,
    /// Owning connection; not persisted per entry
    #[serde(skip)]
    pub connection_path: PathBuf,
    /// Number of fields
    #[serde(default)]
    pub field_count: usize,
    /// Spatial reference display name
    #[serde(default)]
    pub spatial_reference: Option<String>,
    /// Whether the entry can be materialized on a map
    pub can_add_to_map: bool,
    /// Editor tracking fields present
    #[serde(default)]
    pub editor_tracking: bool,
    /// Archiving enabled
    #[serde(default)]
    pub archiving: bool,
    /// Creation date from metadata
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    /// Modification date from metadata
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    /// Descriptive metadata
    #[serde(default)]
    pub metadata: MetadataBlock,
    /// Editor tracking and archiving have been derived this session
    #[serde(skip)]
    pub flags_resolved: bool,
}

impl DatasetEntry {
    /// Creates an entry with kind-derived classification and empty annotations.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: DatasetKind, connection_path: &Path) -> Self {
        let name = name.into();
        Self {
            simple_name: simple_name(&name).to_string(),
            name,
            alias: None,
            kind,
            geometry_type: None,
            icon: classify_entry(kind, None),
            connection_path: connection_path.to_path_buf(),
            field_count: 0,
            spatial_reference: None,
            can_add_to_map: kind.can_add_to_map(),
            editor_tracking: false,
            archiving: false,
            created: None,
            modified: None,
            metadata: MetadataBlock::default(),
            flags_resolved: false,
        }
    }

    /// Sets the geometry type and reclassifies the icon.
    pub fn set_geometry_type(&mut self, geometry_type: Option<String>) {
        self.icon = classify_entry(self.kind, geometry_type.as_deref());
        self.geometry_type = geometry_type;
    }

    /// One-line description: kind, geometry and field count.
    #[must_use]
    pub fn subtitle(&self) -> String {
        let mut parts = vec![self.kind.label().to_string()];
        if let Some(geometry) = self.geometry_type.as_deref().filter(|g| !g.trim().is_empty()) {
            parts.push(geometry.to_string());
        }
        if self.field_count > 0 {
            parts.push(format!("{} fields", self.field_count));
        }
        parts.join(" · ")
    }

    /// Path handed to the map and the clipboard.
    #[must_use]
    pub fn dataset_uri(&self) -> String {
        self.connection_path.join(&self.name).display().to_string()
    }
}

/// Domain kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainKind {
    /// Coded-value list
    CodedValue,
    /// Numeric range
    Range,
}

impl DomainKind {
    /// Returns the display label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::CodedValue => "Coded Value",
            DomainKind::Range => "Range",
        }
    }
}

/// Domain attached to a field, with a bounded preview of its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainSummary {
    /// Domain name
    pub name: String,
    /// Domain kind
    pub kind: DomainKind,
    /// Preview of the legal values
    pub preview: String,
}

impl DomainSummary {
    /// Summarizes a domain, previewing at most `preview_limit` coded values.
    #[must_use]
    pub fn from_definition(domain: &DomainDefinition, preview_limit: usize) -> Self {
        match domain {
            DomainDefinition::CodedValue { name, values } => {
                let mut preview = values
                    .iter()
                    .take(preview_limit)
                    .map(|(code, value)| format!("{code}={value}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                if values.len() > preview_limit {
                    preview.push_str(&format!(" (+{} more)", values.len() - preview_limit));
                }
                Self {
                    name: name.clone(),
                    kind: DomainKind::CodedValue,
                    preview,
                }
            },
            DomainDefinition::Range { name, min, max } => Self {
                name: name.clone(),
                kind: DomainKind::Range,
                preview: format!("{min} – {max}"),
            },
        }
    }
}

/// A field row of the detail view. Recomputed on every detail request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    /// Field name
    pub name: String,
    /// Alias (falls back to the name)
    pub alias: String,
    /// Declared type
    pub field_type: String,
    /// Length in bytes
    pub length: i32,
    /// Nullability
    pub nullable: bool,
    /// Editability
    pub editable: bool,
    /// Attached domain
    pub domain: Option<DomainSummary>,
    /// Default value
    pub default_value: Option<String>,
}

impl FieldEntry {
    /// Builds a detail row from a schema definition.
    #[must_use]
    pub fn from_definition(field: &FieldDefinition, preview_limit: usize) -> Self {
        Self {
            name: field.name.clone(),
            alias: field
                .alias
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| field.name.clone()),
            field_type: field.field_type.clone(),
            length: field.length,
            nullable: field.nullable,
            editable: field.editable,
            domain: field
                .domain
                .as_ref()
                .map(|d| DomainSummary::from_definition(d, preview_limit)),
            default_value: field.default_value.clone(),
        }
    }

    /// Short glyph for the field type.
    #[must_use]
    pub fn type_glyph(&self) -> &'static str {
        crate::utils::field_type_glyph(&self.field_type)
    }

    /// Type, length (strings only), nullability and domain on one line.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![self.field_type.clone()];
        if self.length > 0 && self.field_type == "String" {
            parts.push(format!("({})", self.length));
        }
        if !self.nullable {
            parts.push("NOT NULL".to_string());
        }
        if let Some(domain) = &self.domain {
            parts.push(format!("[{}]", domain.name));
        }
        parts.join(" ")
    }
}

/// Catalog of one connection as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CachedCatalog {
    /// Owning connection path
    pub connection_path: PathBuf,
    /// Capture time
    pub cached_at: DateTime<Utc>,
    /// Kind-then-name ordered entries
    pub datasets: Vec<DatasetEntry>,
}

impl CachedCatalog {
    /// Creates a catalog captured now.
    #[must_use]
    pub fn new(connection_path: &Path, datasets: Vec<DatasetEntry>) -> Self {
        Self {
            connection_path: connection_path.to_path_buf(),
            cached_at: Utc::now(),
            datasets,
        }
    }

    /// Re-attaches the owning connection path to every entry.
    pub fn attach_connection(&mut self) {
        for entry in &mut self.datasets {
            entry.connection_path.clone_from(&self.connection_path);
        }
    }

    /// Number of entries of one kind.
    #[must_use]
    pub fn count(&self, kind: DatasetKind) -> usize {
        self.datasets.iter().filter(|d| d.kind == kind).count()
    }
}
