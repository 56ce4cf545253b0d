//! Per-connection catalog cache on local disk.
//!
//! Each connection's catalog lives in its own JSON file inside a per-user cache
//! directory, named `<connection file stem>_<8 hex digits>.json` where the hex digits
//! are a SHA-256 prefix of the (case-folded) connection path. Files are written to a
//! temporary sibling first and renamed into place, so a failed write never leaves a
//! truncated cache behind. The connection path is stored once per file and re-attached
//! to every entry on load.
//!
//! The same directory also holds `theme.txt`, the panel's theme preference.

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::CacheError;
use crate::model::{CachedCatalog, DatasetEntry};
use crate::settings::Settings;
use crate::utils::paths_equal_ignore_case;

const THEME_FILE: &str = "theme.txt";

/// Borrowed view of a catalog, serialized without cloning the entries.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogRef<'a> {
    connection_path: &'a Path,
    cached_at: DateTime<Utc>,
    datasets: &'a [DatasetEntry],
}

/// Panel colour theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    /// Dark theme
    #[default]
    Dark,
    /// Light theme
    Light,
}

impl Theme {
    /// Returns the literal stored in `theme.txt`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

/// The cache directory and the operations on its files.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Creates a cache rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a cache rooted at the configured cache directory.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.cache_dir.clone())
    }

    /// The cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file used for `connection_path`.
    #[must_use]
    pub fn file_for(&self, connection_path: &Path) -> PathBuf {
        self.dir.join(cache_file_name(connection_path))
    }

    /// Writes the catalog of `connection_path`, replacing any previous one wholesale.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the directory cannot be created or the file cannot be
    /// written. Any previous cache file is left untouched in that case.
    pub fn save(
        &self,
        connection_path: &Path,
        entries: &[DatasetEntry],
    ) -> Result<PathBuf, CacheError> {
        self.ensure_dir()?;
        let target = self.file_for(connection_path);
        let catalog = CatalogRef {
            connection_path,
            cached_at: Utc::now(),
            datasets: entries,
        };

        let write_err = |source: Box<dyn std::error::Error + Send + Sync>| CacheError::Write {
            path: target.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| write_err(Box::new(e)))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &catalog).map_err(|e| write_err(Box::new(e)))?;
            writer.flush().map_err(|e| write_err(Box::new(e)))?;
        }
        tmp.persist(&target)
            .map_err(|e| write_err(Box::new(e.error)))?;

        info!(
            "Cached {} dataset(s) for {} in {}",
            entries.len(),
            connection_path.display(),
            target.display()
        );
        Ok(target)
    }

    /// Reads the cached catalog of `connection_path`.
    ///
    /// Returns `None` on a miss and on any read or parse problem, so the caller can fall
    /// back to a live load.
    #[must_use]
    pub fn load(&self, connection_path: &Path) -> Option<CachedCatalog> {
        match self.read(connection_path) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Ignoring cache: {e}");
                None
            },
        }
    }

    /// Reads the cached catalog, distinguishing a miss from a corrupt file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Corrupt`] if the file exists but cannot be read, does not
    /// parse, or belongs to a different connection.
    pub fn read(&self, connection_path: &Path) -> Result<Option<CachedCatalog>, CacheError> {
        let path = self.file_for(connection_path);
        let corrupt = |message: String| CacheError::Corrupt {
            path: path.clone(),
            message,
        };

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache for {}", connection_path.display());
                return Ok(None);
            },
            Err(e) => return Err(corrupt(e.to_string())),
        };

        let mut catalog: CachedCatalog =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        if !paths_equal_ignore_case(&catalog.connection_path, connection_path) {
            return Err(corrupt(format!(
                "written for {}",
                catalog.connection_path.display()
            )));
        }

        catalog.connection_path = connection_path.to_path_buf();
        catalog.attach_connection();
        debug!(
            "Cache hit for {}: {} dataset(s) from {}",
            connection_path.display(),
            catalog.datasets.len(),
            catalog.cached_at
        );
        Ok(Some(catalog))
    }

    /// Deletes the cache file of `connection_path`. Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Remove`] if the file exists but cannot be deleted.
    pub fn invalidate(&self, connection_path: &Path) -> Result<bool, CacheError> {
        let path = self.file_for(connection_path);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Remove { path, source }),
        }
    }

    /// Reads the theme preference, defaulting to dark.
    #[must_use]
    pub fn load_theme(&self) -> Theme {
        std::fs::read_to_string(self.dir.join(THEME_FILE))
            .ok()
            .and_then(|text| text.parse().ok())
            .unwrap_or_default()
    }

    /// Stores the theme preference.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the directory or file cannot be written.
    pub fn save_theme(&self, theme: Theme) -> Result<(), CacheError> {
        self.ensure_dir()?;
        let path = self.dir.join(THEME_FILE);
        std::fs::write(&path, theme.as_str()).map_err(|e| CacheError::Write {
            path,
            source: Box::new(e),
        })
    }

    fn ensure_dir(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CacheError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }
}

/// File name for a connection's cache: readable prefix plus a stable path hash.
#[must_use]
pub fn cache_file_name(connection_path: &Path) -> String {
    let stem = connection_path
        .file_stem()
        .map_or_else(|| "connection".to_string(), |s| s.to_string_lossy().into_owned());
    let digest = Sha256::digest(connection_path.to_string_lossy().to_lowercase().as_bytes());
    let hash: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();
    format!("{stem}_{hash}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdesearch_core_common::DatasetKind;
    use tempfile::TempDir;

    fn sample_entries(connection: &Path) -> Vec<DatasetEntry> {
        let mut roads = DatasetEntry::new("GIS.OWNER.Roads", DatasetKind::FeatureClass, connection);
        roads.set_geometry_type(Some("Polyline".to_string()));
        roads.field_count = 12;
        roads.spatial_reference = Some("NAD83".to_string());
        roads.alias = Some("Road centerlines".to_string());
        let owners = DatasetEntry::new("GIS.OWNER.Owners", DatasetKind::Table, connection);
        vec![roads, owners]
    }

    #[test]
    fn test_file_name_is_stable_and_readable() {
        let name = cache_file_name(Path::new("/conns/Prod GIS.sde"));
        assert!(name.starts_with("Prod GIS_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "Prod GIS_".len() + 8 + ".json".len());

        let hash_of = |n: &str| n.rsplit('_').next().unwrap().to_string();
        let same_path_other_case = cache_file_name(Path::new("/CONNS/prod gis.SDE"));
        assert_eq!(hash_of(&name), hash_of(&same_path_other_case));
        assert_ne!(name, cache_file_name(Path::new("/other/Prod GIS.sde")));
    }

    #[test]
    fn test_round_trip_restores_connection_path() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path().join("nested"));
        let conn = Path::new("/conns/prod.sde");
        let entries = sample_entries(conn);

        cache.save(conn, &entries).unwrap();
        let loaded = cache.load(conn).unwrap();
        assert_eq!(loaded.datasets, entries);
        assert!(loaded.datasets.iter().all(|d| d.connection_path == conn));
    }

    #[test]
    fn test_entries_omit_connection_path_on_disk() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let conn = Path::new("/conns/prod.sde");
        let file = cache.save(conn, &sample_entries(conn)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
        assert_eq!(json["ConnectionPath"], "/conns/prod.sde");
        assert!(json["CachedAt"].is_string());
        let first = &json["Datasets"][0];
        assert_eq!(first["Name"], "GIS.OWNER.Roads");
        assert!(first.get("ConnectionPath").is_none());
    }

    #[test]
    fn test_corrupt_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let conn = Path::new("/conns/prod.sde");
        std::fs::write(cache.file_for(conn), b"{ not json").unwrap();

        assert!(cache.load(conn).is_none());
        assert!(matches!(cache.read(conn), Err(CacheError::Corrupt { .. })));
    }

    #[test]
    fn test_save_replaces_wholesale() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let conn = Path::new("/conns/prod.sde");
        cache.save(conn, &sample_entries(conn)).unwrap();
        cache.save(conn, &[]).unwrap();
        assert!(cache.load(conn).unwrap().datasets.is_empty());
        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1, "temporary files must not linger");
    }

    #[test]
    fn test_invalidate() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path());
        let conn = Path::new("/conns/prod.sde");
        assert!(!cache.invalidate(conn).unwrap());
        cache.save(conn, &sample_entries(conn)).unwrap();
        assert!(cache.invalidate(conn).unwrap());
        assert!(cache.load(conn).is_none());
    }

    #[test]
    fn test_theme_preference() {
        let dir = TempDir::new().unwrap();
        let cache = DiskCache::new(dir.path().join("cache"));
        assert_eq!(cache.load_theme(), Theme::Dark);
        cache.save_theme(Theme::Light).unwrap();
        assert_eq!(cache.load_theme(), Theme::Light);
        assert_eq!(
            std::fs::read_to_string(cache.dir().join("theme.txt")).unwrap(),
            "light"
        );
        std::fs::write(cache.dir().join("theme.txt"), "sepia").unwrap();
        assert_eq!(cache.load_theme(), Theme::Dark);
    }
}
