//! Custom error types for catalog discovery, caching and detail resolution.
//!
//! This module provides structured error handling using `thiserror`. Every failure
//! reported by an external collaborator is downgraded into one of these kinds, and every
//! kind maps to a short status string through [`SdeSearchError::user_message`], so nothing
//! escapes to the presentation layer as an unhandled fault.

use std::path::PathBuf;

use sdesearch_core_common::DatasetKind;
use thiserror::Error;

/// Main error type for `sdesearch` operations.
///
/// This is the root error type that encompasses all domain-specific errors.
/// It uses `#[error(transparent)]` to delegate display formatting to the
/// underlying error variants.
#[derive(Debug, Error)]
pub enum SdeSearchError {
    /// The database session could not be opened at all
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// One dataset kind could not be enumerated
    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    /// Disk cache read/write/parse failures
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Bad user input, rejected before touching the database
    #[error(transparent)]
    Input(#[from] InputError),

    /// Detail view could not be resolved
    #[error(transparent)]
    Detail(#[from] DetailError),
}

/// Connectivity failures.
///
/// Terminal for the current load; never retried automatically.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Opening the connection file failed
    #[error("Cannot open connection '{path}': {source}")]
    Unreachable {
        /// The connection file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: anyhow::Error,
    },
}

/// Failure enumerating one dataset kind.
///
/// Isolated to its kind: the load records it and carries on with the next kind.
#[derive(Debug, Error)]
#[error("Failed to enumerate {}: {source}", kind.plural_label())]
pub struct EnumerationError {
    /// The kind whose enumeration failed
    pub kind: DatasetKind,
    /// The underlying error
    #[source]
    pub source: anyhow::Error,
}

/// Disk cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache directory could not be created
    #[error("Failed to create cache directory '{path}': {source}")]
    CreateDir {
        /// The directory path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The cache file could not be written
    #[error("Failed to write cache file '{path}': {source}")]
    Write {
        /// The cache file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The cache file could not be removed
    #[error("Failed to remove cache file '{path}': {source}")]
    Remove {
        /// The cache file path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },

    /// The cache file exists but does not parse
    #[error("Cache file '{path}' is corrupt: {message}")]
    Corrupt {
        /// The cache file path
        path: PathBuf,
        /// Description of the parse problem
        message: String,
    },
}

/// Invalid user input.
#[derive(Debug, Error)]
pub enum InputError {
    /// A manually supplied connection path is unusable
    #[error("Invalid connection path '{path}': {reason}")]
    InvalidPath {
        /// The rejected path
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// No dataset with this name in the loaded catalog
    #[error("Dataset '{name}' is not in the loaded catalog")]
    UnknownDataset {
        /// The requested qualified name
        name: String,
    },

    /// The dataset kind cannot be added to a map
    #[error("{kind} '{name}' cannot be added to a map")]
    NotMappable {
        /// The dataset name
        name: String,
        /// The dataset kind
        kind: DatasetKind,
    },

    /// A text query was given with every search scope disabled
    #[error("No search scope is enabled")]
    NoSearchScope,

    /// Another background operation is still outstanding
    #[error("Another operation is still running")]
    Busy,

    /// A configuration value is invalid
    #[error("Invalid {option} setting: {message}")]
    InvalidSetting {
        /// The setting name
        option: String,
        /// Why it's invalid
        message: String,
    },
}

/// Detail resolution errors.
#[derive(Debug, Error)]
pub enum DetailError {
    /// The schema handle for the named object could not be opened
    #[error("Cannot open schema of '{name}': {source}")]
    SchemaUnavailable {
        /// The dataset name
        name: String,
        /// The underlying error
        #[source]
        source: anyhow::Error,
    },

    /// Adding the dataset to the map failed
    #[error("Failed to add '{name}' to the map: {source}")]
    MapAdd {
        /// The dataset name
        name: String,
        /// The underlying error
        #[source]
        source: anyhow::Error,
    },
}

/// Type alias for Results using `SdeSearchError`.
pub type Result<T> = std::result::Result<T, SdeSearchError>;

impl SdeSearchError {
    /// Get the short status string shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection(e) => e.user_message(),
            Self::Enumeration(e) => e.to_string(),
            Self::Cache(e) => format!("Cache error: {e}"),
            Self::Input(e) => e.user_message(),
            Self::Detail(DetailError::SchemaUnavailable { source, .. }) => {
                format!("Error loading details: {source}")
            },
            Self::Detail(DetailError::MapAdd { source, .. }) => {
                format!("Error adding to map: {source}")
            },
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Connection(_) => Some(
                "Check that the connection file is valid and the database is reachable."
                    .to_string(),
            ),
            Self::Cache(CacheError::Corrupt { .. }) => {
                Some("Reload the connection to rebuild its cache.".to_string())
            },
            Self::Input(InputError::InvalidPath { .. }) => {
                Some("Select an existing .sde connection file.".to_string())
            },
            Self::Input(InputError::NoSearchScope) => {
                Some("Enable name or metadata search.".to_string())
            },
            _ => None,
        }
    }

    /// Check if this error is potentially recoverable by a user action.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Cache(_))
    }
}

impl ConnectionError {
    /// Get the short status string shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unreachable { source, .. } => format!("Connection error: {source}"),
        }
    }
}

impl InputError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidPath { path, reason } => format!("{reason}: {}", path.display()),
            Self::Busy => "Please wait for the current operation to finish".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Helper to build an [`InputError::InvalidPath`].
#[must_use]
pub fn invalid_path(path: impl Into<PathBuf>, reason: &str) -> InputError {
    InputError::InvalidPath {
        path: path.into(),
        reason: reason.to_string(),
    }
}
