//! Closed set of dataset kinds found in an enterprise geodatabase.
//!
//! Every catalog object is exactly one of these kinds. Code that branches on the kind
//! matches exhaustively instead of comparing display labels.

use serde::{Deserialize, Serialize};

/// Category of a catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    /// A table with a geometry column.
    FeatureClass,
    /// A plain attribute table.
    Table,
    /// A container grouping feature classes that share a spatial reference.
    FeatureDataset,
    /// A stored relationship between two tables or feature classes.
    RelationshipClass,
}

impl DatasetKind {
    /// Order in which a live load enumerates the kinds.
    pub const ENUMERATION_ORDER: [DatasetKind; 4] = [
        DatasetKind::FeatureDataset,
        DatasetKind::FeatureClass,
        DatasetKind::Table,
        DatasetKind::RelationshipClass,
    ];

    /// Returns the human-readable label used in status text and metadata search.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::FeatureClass => "Feature Class",
            DatasetKind::Table => "Table",
            DatasetKind::FeatureDataset => "Feature Dataset",
            DatasetKind::RelationshipClass => "Relationship Class",
        }
    }

    /// Returns the plural label used in progress messages.
    #[must_use]
    pub fn plural_label(&self) -> &'static str {
        match self {
            DatasetKind::FeatureClass => "feature classes",
            DatasetKind::Table => "tables",
            DatasetKind::FeatureDataset => "feature datasets",
            DatasetKind::RelationshipClass => "relationship classes",
        }
    }

    /// Sort precedence of the kind within a catalog.
    #[must_use]
    pub fn sort_rank(&self) -> u8 {
        match self {
            DatasetKind::FeatureClass => 0,
            DatasetKind::Table => 1,
            DatasetKind::FeatureDataset => 2,
            DatasetKind::RelationshipClass => 3,
        }
    }

    /// Returns `true` for kinds exposing a row/column schema.
    #[must_use]
    pub fn has_schema(&self) -> bool {
        matches!(self, DatasetKind::FeatureClass | DatasetKind::Table)
    }

    /// Returns `true` for kinds the map can materialize as a layer or standalone table.
    #[must_use]
    pub fn can_add_to_map(&self) -> bool {
        self.has_schema()
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_rank_follows_precedence() {
        let mut kinds = DatasetKind::ENUMERATION_ORDER.to_vec();
        kinds.sort_by_key(DatasetKind::sort_rank);
        assert_eq!(
            kinds,
            vec![
                DatasetKind::FeatureClass,
                DatasetKind::Table,
                DatasetKind::FeatureDataset,
                DatasetKind::RelationshipClass,
            ]
        );
    }

    #[test]
    fn test_only_tabular_kinds_can_be_added_to_map() {
        assert!(DatasetKind::FeatureClass.can_add_to_map());
        assert!(DatasetKind::Table.can_add_to_map());
        assert!(!DatasetKind::FeatureDataset.can_add_to_map());
        assert!(!DatasetKind::RelationshipClass.can_add_to_map());
    }

    #[test]
    fn test_display_uses_label() {
        assert_eq!(DatasetKind::RelationshipClass.to_string(), "Relationship Class");
    }
}
