//! The search panel session: connection list, loaded catalog and search state.
//!
//! [`SearchSession`] owns everything one panel instance works with and exposes each user
//! action as an explicit call. Calls that reach the database or the filesystem are
//! async and single-flight: while one is outstanding the shared busy flag is raised and
//! further such calls are rejected with [`InputError::Busy`]. Filtering is synchronous
//! and always allowed.
//!
//! Every failure is mirrored into the status line before being returned, so a
//! presentation layer can simply show [`SearchSession::status`] after each call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;
use sdesearch_core_common::{MapSink, MetadataSource, ProjectCatalog, SessionFactory};
use tokio::sync::watch;

use crate::cache::DiskCache;
use crate::details::{DatasetDetails, DetailResolver};
use crate::error::{InputError, Result, SdeSearchError};
use crate::filter::{
    SearchScopes, TypeVisibility, cleared_status, filter, filter_status, is_wildcard,
};
use crate::loader::{CatalogLoader, LoadOutcome, ProgressReporter};
use crate::map;
use crate::model::{CachedCatalog, ConnectionDescriptor, DatasetEntry};
use crate::registry::ConnectionRegistry;
use crate::settings::Settings;

const IDLE_STATUS: &str = "Select a connection to browse SDE items";

/// Raises the busy flag for as long as it lives.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> std::result::Result<Self, InputError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| InputError::Busy)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// State and operations of one search panel.
pub struct SearchSession {
    settings: Settings,
    cache: DiskCache,
    registry: ConnectionRegistry,
    sessions: Arc<dyn SessionFactory>,
    metadata: Arc<dyn MetadataSource>,
    project: Arc<dyn ProjectCatalog>,
    selected: Option<ConnectionDescriptor>,
    loaded: Option<LoadOutcome>,
    query: String,
    scopes: SearchScopes,
    visibility: TypeVisibility,
    status: String,
    busy: Arc<AtomicBool>,
    progress: watch::Sender<String>,
}

impl SearchSession {
    /// Creates a session with no connection selected.
    #[must_use]
    pub fn new(
        settings: Settings,
        sessions: Arc<dyn SessionFactory>,
        metadata: Arc<dyn MetadataSource>,
        project: Arc<dyn ProjectCatalog>,
    ) -> Self {
        let (progress, _) = watch::channel(String::new());
        Self {
            cache: DiskCache::from_settings(&settings),
            registry: ConnectionRegistry::new(&settings),
            settings,
            sessions,
            metadata,
            project,
            selected: None,
            loaded: None,
            query: String::new(),
            scopes: SearchScopes::default(),
            visibility: TypeVisibility::default(),
            status: IDLE_STATUS.to_string(),
            busy: Arc::new(AtomicBool::new(false)),
            progress,
        }
    }

    /// Subscribes to progress text. Empty text means no operation is reporting.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<String> {
        self.progress.subscribe()
    }

    /// Shared busy flag, raised while a background operation is outstanding.
    #[must_use]
    pub fn busy_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.busy)
    }

    /// Returns `true` while a background operation is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Current status line.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Disk cache used by loads.
    #[must_use]
    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    /// Known connections.
    #[must_use]
    pub fn connections(&self) -> &[ConnectionDescriptor] {
        self.registry.connections()
    }

    /// The selected connection.
    #[must_use]
    pub fn selected_connection(&self) -> Option<&ConnectionDescriptor> {
        self.selected.as_ref()
    }

    /// The loaded catalog.
    #[must_use]
    pub fn catalog(&self) -> Option<&CachedCatalog> {
        self.loaded.as_ref().map(|outcome| &outcome.catalog)
    }

    /// The outcome of the last load.
    #[must_use]
    pub fn last_load(&self) -> Option<&LoadOutcome> {
        self.loaded.as_ref()
    }

    /// Current query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Re-discovers connections. A single discovered connection becomes selected.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Busy`] if another operation is outstanding.
    pub async fn refresh_connections(&mut self) -> Result<&[ConnectionDescriptor]> {
        let _busy = match BusyGuard::acquire(&self.busy) {
            Ok(guard) => guard,
            Err(e) => return self.fail(e),
        };
        let reporter = ProgressReporter::new(self.progress.clone());
        reporter.report("Scanning project connections...");

        let count = self.registry.discover(self.project.as_ref()).await.len();
        self.status = if count > 0 {
            format!("{count} connection(s) found — select one to browse")
        } else {
            "No connections found. Browse for an .sde file below.".to_string()
        };
        if let Some(only) = self.registry.auto_selection() {
            self.selected = Some(only.clone());
        }
        reporter.clear();
        Ok(self.registry.connections())
    }

    /// Registers a connection file typed or browsed by the user and selects it.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidPath`] for a missing file or a wrong extension.
    pub fn add_manual_connection(&mut self, raw_path: &str) -> Result<ConnectionDescriptor> {
        match self.registry.add_manual(raw_path) {
            Ok(conn) => {
                self.status = format!("Added {}", conn.display_name());
                self.selected = Some(conn.clone());
                Ok(conn)
            },
            Err(e) => self.fail(e),
        }
    }

    /// Loads the catalog of `connection`, replacing the current one wholesale.
    ///
    /// Database problems do not fail the call; they are recorded in the returned
    /// outcome and reflected in the status line.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Busy`] if another operation is outstanding.
    pub async fn load_catalog(
        &mut self,
        connection: &ConnectionDescriptor,
        force_refresh: bool,
    ) -> Result<&LoadOutcome> {
        let _busy = match BusyGuard::acquire(&self.busy) {
            Ok(guard) => guard,
            Err(e) => return self.fail(e),
        };
        self.status = "Connecting...".to_string();
        let reporter = ProgressReporter::new(self.progress.clone());
        let loader = CatalogLoader::new(self.sessions.as_ref(), &self.cache, &self.settings);
        let outcome = loader.load(connection, force_refresh, &reporter).await;

        self.status.clone_from(&outcome.status);
        self.selected = Some(connection.clone());
        Ok(self.loaded.insert(outcome))
    }

    /// Sets the query text and returns the number of matching entries.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::NoSearchScope`] for a non-empty query while every search
    /// scope is disabled. The query is kept either way.
    pub fn set_query(&mut self, query: &str) -> Result<usize> {
        self.query = query.to_string();
        self.refilter()
    }

    /// Sets the search scopes and returns the number of matching entries.
    ///
    /// # Errors
    ///
    /// See [`SearchSession::set_query`].
    pub fn set_scopes(&mut self, scopes: SearchScopes) -> Result<usize> {
        self.scopes = scopes;
        self.refilter()
    }

    /// Sets the type toggles and returns the number of matching entries.
    ///
    /// # Errors
    ///
    /// See [`SearchSession::set_query`].
    pub fn set_visibility(&mut self, visibility: TypeVisibility) -> Result<usize> {
        self.visibility = visibility;
        self.refilter()
    }

    /// Entries of the loaded catalog matching the current query and toggles.
    #[must_use]
    pub fn results(&self) -> Vec<&DatasetEntry> {
        self.catalog().map_or_else(Vec::new, |catalog| {
            filter(&catalog.datasets, &self.query, self.scopes, self.visibility)
        })
    }

    /// Clears the query.
    pub fn clear_search(&mut self) {
        self.query.clear();
        self.status = match self.catalog() {
            Some(catalog) => cleared_status(catalog.datasets.len()),
            None => IDLE_STATUS.to_string(),
        };
    }

    /// Resolves the details of the named entry of the loaded catalog.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Busy`] if another operation is outstanding and
    /// [`InputError::UnknownDataset`] if no loaded entry has that name. Schema failures
    /// are reported inside the returned details.
    pub async fn resolve_details(&mut self, qualified_name: &str) -> Result<DatasetDetails> {
        let _busy = match BusyGuard::acquire(&self.busy) {
            Ok(guard) => guard,
            Err(e) => return self.fail(e),
        };

        let resolver =
            DetailResolver::new(self.sessions.as_ref(), self.metadata.as_ref(), &self.settings);
        let Some(entry) = self
            .loaded
            .as_mut()
            .and_then(|outcome| find_entry_mut(&mut outcome.catalog, qualified_name))
        else {
            return self.fail(unknown(qualified_name));
        };

        let details = resolver.resolve(entry).await;
        if details.error.is_some() {
            self.status.clone_from(&details.report);
        }
        Ok(details)
    }

    /// Adds the named entry to the map behind `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Busy`], [`InputError::UnknownDataset`],
    /// [`InputError::NotMappable`] or [`crate::error::DetailError::MapAdd`].
    pub async fn add_to_map(&mut self, qualified_name: &str, sink: &dyn MapSink) -> Result<String> {
        let _busy = match BusyGuard::acquire(&self.busy) {
            Ok(guard) => guard,
            Err(e) => return self.fail(e),
        };
        let Some(entry) = self.find_entry(qualified_name).cloned() else {
            return self.fail(unknown(qualified_name));
        };

        self.status = format!("Adding {} to map...", entry.simple_name);
        match map::add_to_map(&entry, sink).await {
            Ok(status) => {
                self.status.clone_from(&status);
                Ok(status)
            },
            Err(e) => self.fail(e),
        }
    }

    /// Full path of the named entry, for copying.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownDataset`] if no loaded entry has that name.
    pub fn dataset_uri(&mut self, qualified_name: &str) -> Result<String> {
        match self.find_entry(qualified_name).map(DatasetEntry::dataset_uri) {
            Some(uri) => {
                self.status = "Copied path to clipboard".to_string();
                Ok(uri)
            },
            None => self.fail(unknown(qualified_name)),
        }
    }

    /// Looks up a loaded entry by qualified name, ignoring case.
    #[must_use]
    pub fn find_entry(&self, qualified_name: &str) -> Option<&DatasetEntry> {
        self.catalog()?
            .datasets
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(qualified_name))
    }

    fn refilter(&mut self) -> Result<usize> {
        if self.scopes.is_empty() && !is_wildcard(&self.query) {
            return self.fail(InputError::NoSearchScope);
        }
        let total = self.catalog().map_or(0, |c| c.datasets.len());
        let found = self.results().len();
        if let Some(status) = filter_status(found, total, &self.query) {
            self.status = status;
        }
        Ok(found)
    }

    fn fail<T>(&mut self, error: impl Into<SdeSearchError>) -> Result<T> {
        let error = error.into();
        self.status = error.user_message();
        info!("{}", self.status);
        Err(error)
    }
}

fn find_entry_mut<'c>(catalog: &'c mut CachedCatalog, qualified_name: &str) -> Option<&'c mut DatasetEntry> {
    catalog
        .datasets
        .iter_mut()
        .find(|e| e.name.eq_ignore_ascii_case(qualified_name))
}

fn unknown(qualified_name: &str) -> InputError {
    InputError::UnknownDataset {
        name: qualified_name.to_string(),
    }
}
