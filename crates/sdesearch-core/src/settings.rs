//! Runtime settings: where to look for connections and where to keep the cache.
//!
//! Defaults come from the platform's per-user folders (via `dirs`), can be overridden
//! by environment variables, and finally by explicit values set by the caller (the CLI
//! maps its flags onto the builder methods).

use std::path::PathBuf;

use crate::error::InputError;

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "SDESEARCH_CACHE_DIR";
/// Environment variable naming the current project's home folder.
pub const PROJECT_HOME_ENV: &str = "SDESEARCH_PROJECT_HOME";
/// Environment variable overriding the profile-wide connections folder.
pub const PROFILE_CONNECTIONS_ENV: &str = "SDESEARCH_PROFILE_CONNECTIONS";

/// Name of the connections subfolder inside project and profile folders.
pub const CONNECTIONS_FOLDER: &str = "DatabaseConnections";

/// Settings shared by the registry, loader, cache and detail resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding catalog cache files and the theme preference
    pub cache_dir: PathBuf,
    /// Home folder of the current project, if any
    pub project_home: Option<PathBuf>,
    /// Profile-wide connections folder
    pub profile_connections_dir: Option<PathBuf>,
    /// Extension of connection files, without the dot
    pub connection_extension: String,
    /// Characters of description kept in the list snippet
    pub snippet_budget: usize,
    /// Coded values shown in a domain preview
    pub domain_preview_limit: usize,
    /// Progress is reported every this many feature datasets
    pub dataset_progress_interval: usize,
    /// Progress is reported every this many feature classes or tables
    pub table_progress_interval: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            project_home: None,
            profile_connections_dir: default_profile_connections_dir(),
            connection_extension: "sde".to_string(),
            snippet_budget: 120,
            domain_preview_limit: 5,
            dataset_progress_interval: 20,
            table_progress_interval: 25,
        }
    }
}

impl Settings {
    /// Builds settings from defaults and environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidSetting`] when an override is set but empty.
    pub fn from_env() -> Result<Self, InputError> {
        let mut settings = Self::default();
        if let Some(dir) = env_path(CACHE_DIR_ENV)? {
            settings.cache_dir = dir;
        }
        if let Some(dir) = env_path(PROJECT_HOME_ENV)? {
            settings.project_home = Some(dir);
        }
        if let Some(dir) = env_path(PROFILE_CONNECTIONS_ENV)? {
            settings.profile_connections_dir = Some(dir);
        }
        Ok(settings)
    }

    /// Overrides the cache directory.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Sets the project home folder.
    #[must_use]
    pub fn with_project_home(mut self, dir: impl Into<PathBuf>) -> Self {
        self.project_home = Some(dir.into());
        self
    }

    /// Overrides the profile connections folder.
    #[must_use]
    pub fn with_profile_connections_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.profile_connections_dir = dir;
        self
    }

    /// Connections folder inside the project home.
    #[must_use]
    pub fn project_connections_dir(&self) -> Option<PathBuf> {
        self.project_home
            .as_ref()
            .map(|home| home.join(CONNECTIONS_FOLDER))
    }
}

fn env_path(name: &str) -> Result<Option<PathBuf>, InputError> {
    match std::env::var_os(name) {
        None => Ok(None),
        Some(value) if value.is_empty() => Err(InputError::InvalidSetting {
            option: name.to_string(),
            message: "value is empty".to_string(),
        }),
        Some(value) => Ok(Some(PathBuf::from(value))),
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("SdeSearch")
        .join("cache")
}

fn default_profile_connections_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("Esri").join("ArcGISPro").join(CONNECTIONS_FOLDER))
}
