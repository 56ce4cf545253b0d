//! Catalog loading: cache fast path, live enumeration, classification and ordering.
//!
//! A load first consults the disk cache (unless a refresh is forced). On a miss it opens
//! a session and enumerates every dataset kind in a fixed order. Each kind is guarded on
//! its own: a kind that fails to enumerate contributes nothing and the others carry on.
//! Inside a kind, an item whose essential properties cannot be read is skipped. Feature
//! classes that the database also lists as tables are recorded once, as feature classes.
//! The finished catalog is sorted by kind precedence and simple name, written back to the
//! cache, and returned.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use log::{debug, info, warn};
use sdesearch_core_common::{DatasetKind, Definition, GeodatabaseSession, SessionFactory};
use tokio::sync::watch;

use crate::cache::DiskCache;
use crate::error::{ConnectionError, EnumerationError};
use crate::model::{CachedCatalog, ConnectionDescriptor, DatasetEntry};
use crate::settings::Settings;
use crate::utils::simple_name;

/// Publishes overwritable progress text while a load runs.
///
/// Purely observational; the latest message replaces the previous one.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    tx: Option<watch::Sender<String>>,
}

impl ProgressReporter {
    /// Reports into `tx`.
    #[must_use]
    pub fn new(tx: watch::Sender<String>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Discards every report.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Replaces the current progress text.
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("{message}");
        if let Some(tx) = &self.tx {
            tx.send_replace(message);
        }
    }

    /// Clears the progress text.
    pub fn clear(&self) {
        if let Some(tx) = &self.tx {
            tx.send_replace(String::new());
        }
    }
}

/// Where a loaded catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Read from the disk cache
    Cache,
    /// Enumerated from the database
    Live,
}

/// Result of one load call. Loads never fail outright; problems are recorded here.
#[derive(Debug)]
pub struct LoadOutcome {
    /// The catalog (empty if the connection could not be opened)
    pub catalog: CachedCatalog,
    /// Where it came from
    pub source: LoadSource,
    /// Set when the session could not be opened at all
    pub connection_error: Option<ConnectionError>,
    /// Kinds whose enumeration failed
    pub failures: Vec<EnumerationError>,
    /// Items skipped because their properties could not be read
    pub skipped_items: usize,
    /// Status line for the user
    pub status: String,
}

impl LoadOutcome {
    /// Returns `true` when the catalog reflects a complete, successful enumeration or
    /// cache read.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.connection_error.is_none() && self.failures.is_empty() && self.skipped_items == 0
    }
}

/// Accumulates entries across the per-kind enumerations of one live load.
struct Enumeration<'a> {
    connection_path: &'a Path,
    entries: Vec<DatasetEntry>,
    seen: HashSet<(DatasetKind, String)>,
    feature_class_names: HashSet<String>,
    failures: Vec<EnumerationError>,
    skipped_items: usize,
}

impl<'a> Enumeration<'a> {
    fn new(connection_path: &'a Path) -> Self {
        Self {
            connection_path,
            entries: Vec::new(),
            seen: HashSet::new(),
            feature_class_names: HashSet::new(),
            failures: Vec::new(),
            skipped_items: 0,
        }
    }

    /// Records an entry unless it duplicates one already recorded. Tables sharing a
    /// name with a feature class are duplicates.
    fn record(&mut self, entry: DatasetEntry) -> bool {
        let key = entry.name.to_lowercase();
        if entry.kind == DatasetKind::Table && self.feature_class_names.contains(&key) {
            return false;
        }
        if !self.seen.insert((entry.kind, key.clone())) {
            return false;
        }
        if entry.kind == DatasetKind::FeatureClass {
            self.feature_class_names.insert(key);
        }
        self.entries.push(entry);
        true
    }
}

/// Loads the catalog of a connection.
pub struct CatalogLoader<'a> {
    sessions: &'a dyn SessionFactory,
    cache: &'a DiskCache,
    settings: &'a Settings,
}

impl<'a> CatalogLoader<'a> {
    /// Creates a loader opening sessions through `sessions` and caching into `cache`.
    #[must_use]
    pub fn new(sessions: &'a dyn SessionFactory, cache: &'a DiskCache, settings: &'a Settings) -> Self {
        Self {
            sessions,
            cache,
            settings,
        }
    }

    /// Loads the catalog of `connection`.
    ///
    /// Without `force_refresh`, a non-empty cached catalog is returned as-is and the
    /// database is not touched. Otherwise the database is enumerated and the cache is
    /// replaced with the result. Cache write failures are logged and do not affect the
    /// returned catalog.
    pub async fn load(
        &self,
        connection: &ConnectionDescriptor,
        force_refresh: bool,
        progress: &ProgressReporter,
    ) -> LoadOutcome {
        let connection_path = connection.path.as_path();

        if !force_refresh {
            if let Some(catalog) = self.cache.load(connection_path) {
                if !catalog.datasets.is_empty() {
                    info!(
                        "Using cached catalog for {} ({} datasets)",
                        connection.name,
                        catalog.datasets.len()
                    );
                    progress.clear();
                    let status = format!(
                        "{} (cached {})",
                        catalog_status(&connection.name, &catalog),
                        catalog.cached_at.format("%Y-%m-%d %H:%M UTC")
                    );
                    return LoadOutcome {
                        catalog,
                        source: LoadSource::Cache,
                        connection_error: None,
                        failures: Vec::new(),
                        skipped_items: 0,
                        status,
                    };
                }
            }
        }

        progress.report(format!("Connecting to {}...", connection.name));
        let session = match self.sessions.open(connection_path).await {
            Ok(session) => session,
            Err(source) => {
                let error = ConnectionError::Unreachable {
                    path: connection.path.clone(),
                    source,
                };
                warn!("{error}");
                progress.clear();
                let status = error.user_message();
                return LoadOutcome {
                    catalog: CachedCatalog::new(connection_path, Vec::new()),
                    source: LoadSource::Live,
                    connection_error: Some(error),
                    failures: Vec::new(),
                    skipped_items: 0,
                    status,
                };
            },
        };

        let mut state = Enumeration::new(connection_path);
        for kind in DatasetKind::ENUMERATION_ORDER {
            progress.report(format!(
                "Found {} items. Enumerating {}...",
                state.entries.len(),
                kind.plural_label()
            ));
            if let Err(source) = self
                .enumerate_kind(session.as_ref(), kind, &mut state, progress)
                .await
            {
                let failure = EnumerationError { kind, source };
                warn!("{failure}");
                state.failures.push(failure);
            }
        }

        progress.report(format!("Loaded {} items. Sorting...", state.entries.len()));
        let mut entries = state.entries;
        sort_catalog(&mut entries);

        if let Err(e) = self.cache.save(connection_path, &entries) {
            warn!("Catalog of {} not cached: {e}", connection.name);
        }

        let catalog = CachedCatalog::new(connection_path, entries);
        let status = catalog_status(&connection.name, &catalog);
        info!("{status}");
        progress.clear();

        LoadOutcome {
            catalog,
            source: LoadSource::Live,
            connection_error: None,
            failures: state.failures,
            skipped_items: state.skipped_items,
            status,
        }
    }

    async fn enumerate_kind(
        &self,
        session: &dyn GeodatabaseSession,
        kind: DatasetKind,
        state: &mut Enumeration<'_>,
        progress: &ProgressReporter,
    ) -> anyhow::Result<()> {
        let definitions = session.list_definitions(kind).await?;
        let interval = match kind {
            DatasetKind::FeatureDataset => self.settings.dataset_progress_interval,
            _ => self.settings.table_progress_interval,
        }
        .max(1);

        let mut recorded = 0usize;
        for definition in definitions {
            let entry = match build_entry(definition.as_ref(), kind, state.connection_path) {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping a {}: {e:#}", kind.label());
                    state.skipped_items += 1;
                    continue;
                },
            };
            if !state.record(entry) {
                continue;
            }
            recorded += 1;
            if recorded % interval == 0 {
                progress.report(format!(
                    "Found {} items ({recorded} {})...",
                    state.entries.len(),
                    kind.plural_label()
                ));
            }
        }

        debug!("Enumerated {recorded} {}", kind.plural_label());
        Ok(())
    }
}

/// Builds one entry from schema-level properties, without opening the dataset.
///
/// The name is essential, as are the field list of tabular kinds and the endpoints of
/// relationship classes; everything else is best-effort.
fn build_entry(
    definition: &dyn Definition,
    kind: DatasetKind,
    connection_path: &Path,
) -> anyhow::Result<DatasetEntry> {
    let name = definition.name().context("reading name")?;
    let mut entry = DatasetEntry::new(name, kind, connection_path);

    match kind {
        DatasetKind::FeatureClass | DatasetKind::Table => {
            entry.field_count = definition
                .fields()
                .with_context(|| format!("reading fields of {}", entry.name))?
                .len();
            entry.alias = definition.alias_name().ok().flatten().filter(|a| !a.is_empty());
            if kind == DatasetKind::FeatureClass {
                entry.set_geometry_type(definition.shape_type().ok().flatten());
                entry.spatial_reference = definition.spatial_reference().ok().flatten();
            }
        },
        DatasetKind::RelationshipClass => {
            let endpoints = definition
                .relationship_endpoints()
                .with_context(|| format!("reading endpoints of {}", entry.name))?;
            if let Some((origin, destination)) = endpoints {
                entry.metadata.snippet = format!(
                    "Origin: {} → Dest: {}",
                    simple_name(&origin),
                    simple_name(&destination)
                );
            }
        },
        DatasetKind::FeatureDataset => {},
    }

    Ok(entry)
}

/// Sorts entries by kind precedence, then simple name ignoring case. Stable.
pub fn sort_catalog(entries: &mut [DatasetEntry]) {
    entries.sort_by_cached_key(|e| (e.kind.sort_rank(), e.simple_name.to_lowercase()));
}

/// Per-kind tally of a catalog, prefixed by the connection name.
#[must_use]
pub fn catalog_status(connection_name: &str, catalog: &CachedCatalog) -> String {
    format!(
        "{connection_name}: {} feature classes, {} tables, {} datasets, {} relationships",
        catalog.count(DatasetKind::FeatureClass),
        catalog.count(DatasetKind::Table),
        catalog.count(DatasetKind::FeatureDataset),
        catalog.count(DatasetKind::RelationshipClass),
    )
}
