//! Icon classification for geometry types and dataset kinds.
//!
//! This module maps a raw geometry or kind string (as reported by the database, e.g.
//! `"esriGeometryPolygon"` or `"Feature Dataset"`) onto a small closed set of icon
//! categories. Matching is case-insensitive substring matching against a static, ordered
//! rule table; the first matching rule wins.
//!
//! # Examples
//!
//! ```
//! use sdesearch_core::classify::{IconCategory, classify};
//!
//! assert_eq!(classify(Some("esriGeometryPolygon")), IconCategory::Polygon);
//! assert_eq!(classify(Some("Multipoint")), IconCategory::Point);
//! assert_eq!(classify(None), IconCategory::Unknown);
//! ```

use sdesearch_core_common::DatasetKind;
use serde::{Deserialize, Serialize};

/// Icon category of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IconCategory {
    /// Point or multipoint feature class.
    Point,
    /// Line feature class.
    Polyline,
    /// Polygon feature class.
    Polygon,
    /// 3D multipatch feature class.
    Multipatch,
    /// Attribute table.
    Table,
    /// Feature dataset.
    Dataset,
    /// Relationship class.
    Relationship,
    /// Anything not recognized.
    Unknown,
}

impl IconCategory {
    /// Returns the glyph shown next to entries of this category.
    #[must_use]
    pub fn glyph(&self) -> &'static str {
        match self {
            IconCategory::Point => "📍",
            IconCategory::Polyline => "〰️",
            IconCategory::Polygon => "⬡",
            IconCategory::Multipatch => "🔶",
            IconCategory::Table => "📋",
            IconCategory::Dataset => "📁",
            IconCategory::Relationship => "🔗",
            IconCategory::Unknown => "🗺️",
        }
    }
}

/// One classification rule: a lowercase needle and the category it selects.
#[derive(Debug, Clone, Copy)]
struct Rule {
    needle: &'static str,
    category: IconCategory,
}

impl Rule {
    const fn new(needle: &'static str, category: IconCategory) -> Self {
        Self { needle, category }
    }
}

/// Ordered rule table. Point comes last among geometry rules so that it never shadows
/// a more specific match.
const RULES: [Rule; 7] = [
    Rule::new("polygon", IconCategory::Polygon),
    Rule::new("line", IconCategory::Polyline),
    Rule::new("multipatch", IconCategory::Multipatch),
    Rule::new("point", IconCategory::Point),
    Rule::new("relationship", IconCategory::Relationship),
    Rule::new("dataset", IconCategory::Dataset),
    Rule::new("table", IconCategory::Table),
];

/// Classifies a raw geometry or kind string.
///
/// Total and pure: unmatched or absent input yields [`IconCategory::Unknown`].
#[must_use]
pub fn classify(raw: Option<&str>) -> IconCategory {
    let Some(raw) = raw else {
        return IconCategory::Unknown;
    };
    let lowered = raw.to_lowercase();
    RULES
        .iter()
        .find(|rule| lowered.contains(rule.needle))
        .map_or(IconCategory::Unknown, |rule| rule.category)
}

/// Classifies a catalog entry from its kind and, for feature classes, its geometry.
#[must_use]
pub fn classify_entry(kind: DatasetKind, geometry: Option<&str>) -> IconCategory {
    match kind {
        DatasetKind::FeatureClass => classify(geometry),
        DatasetKind::Table => IconCategory::Table,
        DatasetKind::FeatureDataset => IconCategory::Dataset,
        DatasetKind::RelationshipClass => IconCategory::Relationship,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_any_case() {
        for raw in ["polygon", "POLYGON", "esriGeometryPolygon", "MultiPolygonZ"] {
            assert_eq!(classify(Some(raw)), IconCategory::Polygon, "{raw}");
        }
    }

    #[test]
    fn test_line_variants() {
        assert_eq!(classify(Some("Polyline")), IconCategory::Polyline);
        assert_eq!(classify(Some("esriGeometryLine")), IconCategory::Polyline);
    }

    #[test]
    fn test_point_and_multipoint() {
        assert_eq!(classify(Some("Point")), IconCategory::Point);
        assert_eq!(classify(Some("Multipoint")), IconCategory::Point);
    }

    #[test]
    fn test_multipatch() {
        assert_eq!(classify(Some("esriGeometryMultiPatch")), IconCategory::Multipatch);
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(classify(Some("Table")), IconCategory::Table);
        assert_eq!(classify(Some("Feature Dataset")), IconCategory::Dataset);
        assert_eq!(classify(Some("Relationship Class")), IconCategory::Relationship);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify(None), IconCategory::Unknown);
        assert_eq!(classify(Some("")), IconCategory::Unknown);
        assert_eq!(classify(Some("Envelope")), IconCategory::Unknown);
    }

    #[test]
    fn test_classify_entry_uses_kind_for_non_feature_classes() {
        assert_eq!(
            classify_entry(DatasetKind::Table, Some("Polygon")),
            IconCategory::Table
        );
        assert_eq!(
            classify_entry(DatasetKind::FeatureClass, Some("Polygon")),
            IconCategory::Polygon
        );
        assert_eq!(
            classify_entry(DatasetKind::FeatureClass, None),
            IconCategory::Unknown
        );
    }
}
