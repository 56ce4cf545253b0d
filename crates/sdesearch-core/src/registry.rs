//! Discovery and de-duplication of database connection files.
//!
//! Connections come from three discovery sources, scanned in order: the database items
//! registered with the current project, the project's connections folder, and the user
//! profile's connections folder. Users can also add connection files by hand; those are
//! kept across re-discovery. A failing source contributes nothing and never aborts
//! discovery.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use sdesearch_core_common::ProjectCatalog;

use crate::error::{InputError, invalid_path};
use crate::model::{ConnectionDescriptor, ConnectionOrigin};
use crate::settings::{CONNECTIONS_FOLDER, Settings};
use crate::utils::{StrMatchExt, has_extension};

/// The connection list of one panel session.
#[derive(Debug, Clone)]
pub struct ConnectionRegistry {
    project_connections_dir: Option<PathBuf>,
    profile_connections_dir: Option<PathBuf>,
    extension: String,
    connections: Vec<ConnectionDescriptor>,
}

impl ConnectionRegistry {
    /// Creates an empty registry scanning the folders named in `settings`.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            project_connections_dir: settings.project_connections_dir(),
            profile_connections_dir: settings.profile_connections_dir.clone(),
            extension: settings.connection_extension.clone(),
            connections: Vec::new(),
        }
    }

    /// Currently known connections.
    #[must_use]
    pub fn connections(&self) -> &[ConnectionDescriptor] {
        &self.connections
    }

    /// The connection to select automatically: the only one, if there is exactly one.
    #[must_use]
    pub fn auto_selection(&self) -> Option<&ConnectionDescriptor> {
        match self.connections.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Finds a known connection by path, ignoring case.
    #[must_use]
    pub fn find(&self, path: &Path) -> Option<&ConnectionDescriptor> {
        self.connections.iter().find(|c| c.matches_path(path))
    }

    /// Re-scans every discovery source and rebuilds the list.
    ///
    /// Manually added connections survive the rebuild. The result is de-duplicated by
    /// path (ignoring case; the first source to report a path wins) and sorted by
    /// display name.
    pub async fn discover(&mut self, project: &dyn ProjectCatalog) -> &[ConnectionDescriptor] {
        let mut found: Vec<ConnectionDescriptor> = Vec::new();

        match project.database_items().await {
            Ok(items) => {
                for item in items {
                    if self.is_project_connection(&item.path) {
                        push_unique(
                            &mut found,
                            ConnectionDescriptor {
                                name: item.name,
                                path: item.path,
                                origin: ConnectionOrigin::Project,
                            },
                        );
                    }
                }
            },
            Err(e) => warn!("Skipping project connections: {e}"),
        }

        if let Some(dir) = self.project_connections_dir.clone() {
            self.scan_folder(&mut found, &dir, ConnectionOrigin::ProjectFolder)
                .await;
        }
        if let Some(dir) = self.profile_connections_dir.clone() {
            self.scan_folder(&mut found, &dir, ConnectionOrigin::ProfileFolder)
                .await;
        }

        let manual = self
            .connections
            .drain(..)
            .filter(|c| c.origin == ConnectionOrigin::Manual);
        for conn in manual.collect::<Vec<_>>() {
            push_unique(&mut found, conn);
        }

        found.sort_by_cached_key(|c| (c.display_name().to_lowercase(), c.path.clone()));
        info!("Discovered {} connection(s)", found.len());
        self.connections = found;
        &self.connections
    }

    /// Registers a connection file given by the user.
    ///
    /// Surrounding whitespace and quotes are stripped. If the file is already known,
    /// the existing descriptor is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidPath`] if the file does not exist or does not carry
    /// the connection-file extension.
    pub fn add_manual(&mut self, raw: &str) -> Result<ConnectionDescriptor, InputError> {
        let cleaned = raw.trim().trim_matches('"').trim();
        if cleaned.is_empty() {
            return Err(invalid_path(cleaned, "No path given"));
        }
        let path = PathBuf::from(cleaned);
        if !path.is_file() {
            return Err(invalid_path(path, "File not found"));
        }
        if !has_extension(&path, &self.extension) {
            return Err(invalid_path(
                path,
                &format!("Please select a .{} connection file", self.extension),
            ));
        }

        if let Some(existing) = self.find(&path) {
            return Ok(existing.clone());
        }

        let conn = ConnectionDescriptor::from_path(path, ConnectionOrigin::Manual);
        info!("Added manual connection {}", conn.path.display());
        self.connections.push(conn.clone());
        Ok(conn)
    }

    fn is_project_connection(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        !text.is_empty()
            && (has_extension(path, &self.extension) || text.contains_ignore_case(CONNECTIONS_FOLDER))
    }

    async fn scan_folder(
        &self,
        found: &mut Vec<ConnectionDescriptor>,
        dir: &Path,
        origin: ConnectionOrigin,
    ) {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Skipping connections folder {}: {e}", dir.display());
                return;
            },
        };

        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
                    if is_file && has_extension(&path, &self.extension) {
                        push_unique(found, ConnectionDescriptor::from_path(path, origin));
                    }
                },
                Ok(None) => break,
                Err(e) => {
                    debug!("Stopped scanning {}: {e}", dir.display());
                    break;
                },
            }
        }
    }
}

fn push_unique(found: &mut Vec<ConnectionDescriptor>, conn: ConnectionDescriptor) {
    if !found.iter().any(|c| c.matches_path(&conn.path)) {
        found.push(conn);
    }
}
