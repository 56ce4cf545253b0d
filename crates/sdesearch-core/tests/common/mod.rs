//! In-memory geodatabase with call counters, shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use sdesearch_core_common::{
    DatasetKind, Definition, FieldDefinition, GeodatabaseSession, MetadataSource, SessionFactory,
};

/// A definition whose accessors fail when the backing value is absent.
#[derive(Debug, Clone, Default)]
pub struct FakeDefinition {
    pub name: Option<String>,
    pub alias: Option<String>,
    pub shape_type: Option<String>,
    pub spatial_reference: Option<String>,
    pub fields: Option<Vec<FieldDefinition>>,
    pub endpoints: Option<(String, String)>,
    pub endpoints_fail: bool,
}

impl FakeDefinition {
    pub fn feature_class(name: &str, shape_type: &str, fields: &[&str]) -> Self {
        Self {
            name: Some(name.to_string()),
            shape_type: Some(shape_type.to_string()),
            spatial_reference: Some("WGS 1984".to_string()),
            fields: Some(field_list(fields)),
            ..Self::default()
        }
    }

    pub fn table(name: &str, fields: &[&str]) -> Self {
        Self {
            name: Some(name.to_string()),
            fields: Some(field_list(fields)),
            ..Self::default()
        }
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn relationship(name: &str, origin: &str, destination: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            endpoints: Some((origin.to_string(), destination.to_string())),
            ..Self::default()
        }
    }
}

fn field_list(names: &[&str]) -> Vec<FieldDefinition> {
    let mut fields = vec![FieldDefinition::new("OBJECTID", "OID")];
    fields.extend(names.iter().map(|n| FieldDefinition::new(*n, "String")));
    fields
}

impl Definition for FakeDefinition {
    fn name(&self) -> Result<String> {
        self.name.clone().ok_or_else(|| anyhow!("name unavailable"))
    }

    fn alias_name(&self) -> Result<Option<String>> {
        Ok(self.alias.clone())
    }

    fn shape_type(&self) -> Result<Option<String>> {
        Ok(self.shape_type.clone())
    }

    fn spatial_reference(&self) -> Result<Option<String>> {
        Ok(self.spatial_reference.clone())
    }

    fn fields(&self) -> Result<Vec<FieldDefinition>> {
        self.fields.clone().ok_or_else(|| anyhow!("fields unavailable"))
    }

    fn relationship_endpoints(&self) -> Result<Option<(String, String)>> {
        if self.endpoints_fail {
            bail!("endpoints unavailable");
        }
        Ok(self.endpoints.clone())
    }
}

/// Counts of collaborator calls.
#[derive(Debug, Default)]
pub struct CallCounters {
    pub opens: AtomicUsize,
    pub lists: AtomicUsize,
    pub get_definitions: AtomicUsize,
    pub archive_queries: AtomicUsize,
    pub metadata_fetches: AtomicUsize,
}

impl CallCounters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct State {
    definitions: HashMap<DatasetKind, Vec<FakeDefinition>>,
    failing_kinds: HashSet<DatasetKind>,
    archived: HashSet<String>,
    metadata: HashMap<String, String>,
    unreachable: bool,
    counters: CallCounters,
}

/// Session factory and metadata source over an in-memory geodatabase.
#[derive(Debug, Clone, Default)]
pub struct FakeGeodatabase {
    state: Arc<State>,
}

/// Builder for [`FakeGeodatabase`].
#[derive(Debug, Default)]
pub struct FakeGeodatabaseBuilder {
    state: State,
}

impl FakeGeodatabaseBuilder {
    pub fn with(mut self, kind: DatasetKind, definition: FakeDefinition) -> Self {
        self.state.definitions.entry(kind).or_default().push(definition);
        self
    }

    pub fn failing(mut self, kind: DatasetKind) -> Self {
        self.state.failing_kinds.insert(kind);
        self
    }

    pub fn archived(mut self, name: &str) -> Self {
        self.state.archived.insert(name.to_string());
        self
    }

    pub fn metadata(mut self, name: &str, xml: &str) -> Self {
        self.state.metadata.insert(name.to_string(), xml.to_string());
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.state.unreachable = true;
        self
    }

    pub fn build(self) -> FakeGeodatabase {
        FakeGeodatabase {
            state: Arc::new(self.state),
        }
    }
}

impl FakeGeodatabase {
    pub fn builder() -> FakeGeodatabaseBuilder {
        FakeGeodatabaseBuilder::default()
    }

    pub fn counters(&self) -> &CallCounters {
        &self.state.counters
    }
}

struct FakeSession {
    state: Arc<State>,
}

#[async_trait]
impl GeodatabaseSession for FakeSession {
    async fn list_definitions(&self, kind: DatasetKind) -> Result<Vec<Box<dyn Definition>>> {
        self.state.counters.lists.fetch_add(1, Ordering::SeqCst);
        if self.state.failing_kinds.contains(&kind) {
            bail!("listing {} timed out", kind.plural_label());
        }
        Ok(self
            .state
            .definitions
            .get(&kind)
            .map(|defs| {
                defs.iter()
                    .map(|d| Box::new(d.clone()) as Box<dyn Definition>)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_definition(&self, kind: DatasetKind, name: &str) -> Result<Box<dyn Definition>> {
        self.state
            .counters
            .get_definitions
            .fetch_add(1, Ordering::SeqCst);
        self.state
            .definitions
            .get(&kind)
            .and_then(|defs| defs.iter().find(|d| d.name.as_deref() == Some(name)))
            .map(|d| Box::new(d.clone()) as Box<dyn Definition>)
            .ok_or_else(|| anyhow!("{name} does not exist"))
    }

    async fn is_archived(&self, name: &str) -> Result<bool> {
        self.state
            .counters
            .archive_queries
            .fetch_add(1, Ordering::SeqCst);
        Ok(self.state.archived.contains(name))
    }
}

#[async_trait]
impl SessionFactory for FakeGeodatabase {
    async fn open(&self, connection_path: &Path) -> Result<Box<dyn GeodatabaseSession>> {
        self.state.counters.opens.fetch_add(1, Ordering::SeqCst);
        if self.state.unreachable {
            bail!("cannot connect to {}", connection_path.display());
        }
        Ok(Box::new(FakeSession {
            state: Arc::clone(&self.state),
        }))
    }
}

#[async_trait]
impl MetadataSource for FakeGeodatabase {
    async fn metadata_xml(&self, _connection_path: &Path, qualified_name: &str) -> Result<Option<String>> {
        self.state
            .counters
            .metadata_fetches
            .fetch_add(1, Ordering::SeqCst);
        Ok(self.state.metadata.get(qualified_name).cloned())
    }
}
