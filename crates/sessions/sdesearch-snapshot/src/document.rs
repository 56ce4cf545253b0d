//! The snapshot document and its lookups.

use std::path::Path;

use anyhow::{Context, Result};
use sdesearch_core_common::{DatasetKind, FieldDefinition};
use serde::{Deserialize, Serialize};

/// One dataset-like object of a snapshot. Which properties apply depends on the kind
/// list the object appears in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotDataset {
    /// Fully qualified name
    pub name: String,
    /// Alias name
    pub alias: Option<String>,
    /// Shape type (feature classes)
    pub shape_type: Option<String>,
    /// Spatial reference name (feature classes)
    pub spatial_reference: Option<String>,
    /// Field schema (feature classes and tables)
    pub fields: Vec<FieldDefinition>,
    /// Origin class (relationship classes)
    pub origin: Option<String>,
    /// Destination class (relationship classes)
    pub destination: Option<String>,
    /// Whether archiving is enabled
    pub archived: bool,
    /// Metadata document
    pub metadata_xml: Option<String>,
}

/// Schema snapshot of one geodatabase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Feature datasets
    pub feature_datasets: Vec<SnapshotDataset>,
    /// Feature classes
    pub feature_classes: Vec<SnapshotDataset>,
    /// Stand-alone tables
    pub tables: Vec<SnapshotDataset>,
    /// Relationship classes
    pub relationship_classes: Vec<SnapshotDataset>,
}

impl Snapshot {
    /// Reads and parses a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub async fn read(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Cannot read snapshot '{}'", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid snapshot '{}'", path.display()))
    }

    /// Parses a snapshot from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not a valid snapshot.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Datasets listed under `kind`.
    ///
    /// Feature classes are tables too: the table listing includes them, the way
    /// geodatabases report table definitions.
    #[must_use]
    pub fn list(&self, kind: DatasetKind) -> Vec<&SnapshotDataset> {
        match kind {
            DatasetKind::FeatureDataset => self.feature_datasets.iter().collect(),
            DatasetKind::FeatureClass => self.feature_classes.iter().collect(),
            DatasetKind::Table => self.feature_classes.iter().chain(&self.tables).collect(),
            DatasetKind::RelationshipClass => self.relationship_classes.iter().collect(),
        }
    }

    /// Finds a dataset of `kind` by name, ignoring case.
    #[must_use]
    pub fn find(&self, kind: DatasetKind, name: &str) -> Option<&SnapshotDataset> {
        self.list(kind)
            .into_iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Finds a dataset of any kind by name, ignoring case.
    #[must_use]
    pub fn find_any(&self, name: &str) -> Option<&SnapshotDataset> {
        DatasetKind::ENUMERATION_ORDER
            .iter()
            .find_map(|kind| self.find(*kind, name))
    }
}
