//! Instant, synchronous filtering of a loaded catalog.
//!
//! Filtering never suspends and never mutates the catalog. It is meant to run on every
//! keystroke: type toggles drop entries first, then every whitespace-separated query term
//! must match the entry under at least one enabled search scope. Catalog order is kept.

use sdesearch_core_common::DatasetKind;

use crate::model::DatasetEntry;
use crate::utils::StrMatchExt;

/// Which entry attributes a query term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchScopes {
    /// Qualified name, simple name and alias
    pub by_name: bool,
    /// Description, summary, tags, purpose, credits, snippet and kind label
    pub by_metadata: bool,
}

impl Default for SearchScopes {
    fn default() -> Self {
        Self {
            by_name: true,
            by_metadata: false,
        }
    }
}

impl SearchScopes {
    /// Returns `true` if no scope is enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.by_name && !self.by_metadata
    }
}

/// Per-kind visibility toggles. Relationship classes are always visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeVisibility {
    /// Show feature classes
    pub feature_classes: bool,
    /// Show tables
    pub tables: bool,
    /// Show feature datasets
    pub feature_datasets: bool,
}

impl Default for TypeVisibility {
    fn default() -> Self {
        Self {
            feature_classes: true,
            tables: true,
            feature_datasets: true,
        }
    }
}

impl TypeVisibility {
    /// Returns `true` if entries of `kind` are shown.
    #[must_use]
    pub fn shows(&self, kind: DatasetKind) -> bool {
        match kind {
            DatasetKind::FeatureClass => self.feature_classes,
            DatasetKind::Table => self.tables,
            DatasetKind::FeatureDataset => self.feature_datasets,
            DatasetKind::RelationshipClass => true,
        }
    }
}

/// Returns `true` for a query that selects everything: blank, or a lone `*`.
#[must_use]
pub fn is_wildcard(query: &str) -> bool {
    matches!(query.trim(), "" | "*")
}

/// Filters `catalog` by type toggles and query, preserving catalog order.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sdesearch_core::filter::{SearchScopes, TypeVisibility, filter};
/// use sdesearch_core::model::DatasetEntry;
/// use sdesearch_core_common::DatasetKind;
///
/// let conn = Path::new("prod.sde");
/// let catalog = vec![
///     DatasetEntry::new("GIS.Roads_2020", DatasetKind::FeatureClass, conn),
///     DatasetEntry::new("GIS.Parcels", DatasetKind::FeatureClass, conn),
/// ];
/// let hits = filter(&catalog, "roads", SearchScopes::default(), TypeVisibility::default());
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].simple_name, "Roads_2020");
/// ```
#[must_use]
pub fn filter<'a>(
    catalog: &'a [DatasetEntry],
    query: &str,
    scopes: SearchScopes,
    visibility: TypeVisibility,
) -> Vec<&'a DatasetEntry> {
    let terms: Vec<String> = if is_wildcard(query) {
        Vec::new()
    } else {
        query.split_whitespace().map(str::to_lowercase).collect()
    };

    catalog
        .iter()
        .filter(|entry| visibility.shows(entry.kind))
        .filter(|entry| terms.iter().all(|term| term_matches(entry, term, scopes)))
        .collect()
}

/// Status line after filtering. Wildcard queries leave the status alone.
#[must_use]
pub fn filter_status(found: usize, total: usize, query: &str) -> Option<String> {
    (!is_wildcard(query))
        .then(|| format!("Found {found} of {total} items matching \"{}\"", query.trim()))
}

/// Status line after the search is cleared.
#[must_use]
pub fn cleared_status(total: usize) -> String {
    if total > 0 {
        format!("Showing all {total} items")
    } else {
        "Select a connection to browse SDE items".to_string()
    }
}

/// Matches one lowercased term against the enabled scopes of an entry.
fn term_matches(entry: &DatasetEntry, term: &str, scopes: SearchScopes) -> bool {
    (scopes.by_name && matches_name(entry, term))
        || (scopes.by_metadata && matches_metadata(entry, term))
}

fn matches_name(entry: &DatasetEntry, term: &str) -> bool {
    entry.name.contains_lowered(term)
        || entry.simple_name.contains_lowered(term)
        || entry
            .alias
            .as_deref()
            .is_some_and(|alias| alias.contains_lowered(term))
}

fn matches_metadata(entry: &DatasetEntry, term: &str) -> bool {
    let metadata = &entry.metadata;
    [
        metadata.description.as_str(),
        metadata.summary.as_str(),
        metadata.tags.as_str(),
        metadata.purpose.as_str(),
        metadata.credits.as_str(),
        metadata.snippet.as_str(),
        entry.kind.label(),
    ]
    .iter()
    .any(|field| field.contains_lowered(term))
}
