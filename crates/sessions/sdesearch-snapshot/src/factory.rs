//! Session factory and metadata source over snapshot files.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use sdesearch_core_common::{
    DatasetKind, Definition, FieldDefinition, GeodatabaseSession, MetadataSource, SessionFactory,
};

use crate::document::{Snapshot, SnapshotDataset};

/// Where the snapshot of a connection is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// `<connection file stem>.json` next to the connection file
    Sidecar,
    /// One snapshot file serving every connection
    File(PathBuf),
}

/// Opens sessions over snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotSessionFactory {
    source: SnapshotSource,
}

impl SnapshotSessionFactory {
    /// Reads sidecar snapshots next to each connection file.
    #[must_use]
    pub fn sidecar() -> Self {
        Self {
            source: SnapshotSource::Sidecar,
        }
    }

    /// Reads every connection's schema from `path`.
    #[must_use]
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: SnapshotSource::File(path.into()),
        }
    }

    /// Where snapshots are read from.
    #[must_use]
    pub fn source(&self) -> &SnapshotSource {
        &self.source
    }

    /// Snapshot file serving `connection_path`.
    #[must_use]
    pub fn snapshot_path(&self, connection_path: &Path) -> PathBuf {
        match &self.source {
            SnapshotSource::Sidecar => connection_path.with_extension("json"),
            SnapshotSource::File(path) => path.clone(),
        }
    }

    async fn snapshot(&self, connection_path: &Path) -> Result<Snapshot> {
        let path = self.snapshot_path(connection_path);
        debug!("Reading snapshot {}", path.display());
        Snapshot::read(&path).await
    }
}

#[async_trait]
impl SessionFactory for SnapshotSessionFactory {
    async fn open(&self, connection_path: &Path) -> Result<Box<dyn GeodatabaseSession>> {
        let snapshot = self.snapshot(connection_path).await?;
        Ok(Box::new(SnapshotSession { snapshot }))
    }
}

#[async_trait]
impl MetadataSource for SnapshotSessionFactory {
    async fn metadata_xml(
        &self,
        connection_path: &Path,
        qualified_name: &str,
    ) -> Result<Option<String>> {
        let snapshot = self.snapshot(connection_path).await?;
        Ok(snapshot
            .find_any(qualified_name)
            .and_then(|d| d.metadata_xml.clone()))
    }
}

struct SnapshotSession {
    snapshot: Snapshot,
}

#[async_trait]
impl GeodatabaseSession for SnapshotSession {
    async fn list_definitions(&self, kind: DatasetKind) -> Result<Vec<Box<dyn Definition>>> {
        Ok(self
            .snapshot
            .list(kind)
            .into_iter()
            .map(|dataset| SnapshotDefinition::boxed(dataset, kind))
            .collect())
    }

    async fn get_definition(&self, kind: DatasetKind, name: &str) -> Result<Box<dyn Definition>> {
        self.snapshot
            .find(kind, name)
            .map(|dataset| SnapshotDefinition::boxed(dataset, kind))
            .ok_or_else(|| anyhow!("{} '{name}' not found", kind.label()))
    }

    async fn is_archived(&self, name: &str) -> Result<bool> {
        self.snapshot
            .find(DatasetKind::Table, name)
            .map(|dataset| dataset.archived)
            .ok_or_else(|| anyhow!("Dataset '{name}' not found"))
    }
}

struct SnapshotDefinition {
    dataset: SnapshotDataset,
    kind: DatasetKind,
}

impl SnapshotDefinition {
    fn boxed(dataset: &SnapshotDataset, kind: DatasetKind) -> Box<dyn Definition> {
        Box::new(Self {
            dataset: dataset.clone(),
            kind,
        })
    }
}

impl Definition for SnapshotDefinition {
    fn name(&self) -> Result<String> {
        if self.dataset.name.trim().is_empty() {
            return Err(anyhow!("{} without a name", self.kind.label()));
        }
        Ok(self.dataset.name.clone())
    }

    fn alias_name(&self) -> Result<Option<String>> {
        Ok(self.dataset.alias.clone())
    }

    fn shape_type(&self) -> Result<Option<String>> {
        Ok(match self.kind {
            DatasetKind::FeatureClass => self.dataset.shape_type.clone(),
            _ => None,
        })
    }

    fn spatial_reference(&self) -> Result<Option<String>> {
        Ok(self.dataset.spatial_reference.clone())
    }

    fn fields(&self) -> Result<Vec<FieldDefinition>> {
        if self.kind.has_schema() {
            Ok(self.dataset.fields.clone())
        } else {
            Err(anyhow!("{} has no fields", self.kind.label()))
        }
    }

    fn relationship_endpoints(&self) -> Result<Option<(String, String)>> {
        Ok(self
            .dataset
            .origin
            .clone()
            .zip(self.dataset.destination.clone()))
    }
}
