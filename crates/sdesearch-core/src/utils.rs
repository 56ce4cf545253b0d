//! Utility functions and extension traits for text and path handling.
//!
//! This module provides the case-insensitive comparisons used throughout the catalog
//! (names, paths and search terms all compare ignoring case), plus small formatting
//! helpers.

use std::path::Path;

/// Extension trait for case-insensitive text matching.
///
/// # Examples
///
/// ```
/// use sdesearch_core::utils::StrMatchExt;
///
/// assert!("OWNER.Roads_2020".contains_ignore_case("roads"));
/// assert!(!"Parcels".contains_ignore_case("roads"));
/// ```
pub trait StrMatchExt {
    /// Returns `true` if `needle` occurs in `self`, ignoring case.
    fn contains_ignore_case(&self, needle: &str) -> bool;

    /// Returns `true` if `needle`, already lowercased, occurs in `self` ignoring case.
    fn contains_lowered(&self, lowered_needle: &str) -> bool;
}

impl StrMatchExt for str {
    fn contains_ignore_case(&self, needle: &str) -> bool {
        self.contains_lowered(&needle.to_lowercase())
    }

    fn contains_lowered(&self, lowered_needle: &str) -> bool {
        self.to_lowercase().contains(lowered_needle)
    }
}

/// Returns the part of a qualified name after its last `.`.
///
/// # Examples
///
/// ```
/// use sdesearch_core::utils::simple_name;
///
/// assert_eq!(simple_name("GIS.OWNER.ROADS"), "ROADS");
/// assert_eq!(simple_name("ROADS"), "ROADS");
/// ```
#[must_use]
pub fn simple_name(qualified: &str) -> &str {
    qualified
        .rfind('.')
        .map_or(qualified, |idx| &qualified[idx + 1..])
}

/// Compares two paths ignoring case.
#[must_use]
pub fn paths_equal_ignore_case(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

/// Returns `true` if `path` has the given extension, ignoring case.
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
}

/// Truncates `text` to at most `budget` characters, appending `…` when shortened.
#[must_use]
pub fn truncate_chars(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(budget).collect();
    truncated.push('…');
    truncated
}

/// Short glyph for a declared field type.
#[must_use]
pub fn field_type_glyph(field_type: &str) -> &'static str {
    match field_type {
        "String" => "Abc",
        "Integer" | "SmallInteger" | "BigInteger" => "123",
        "Double" | "Single" => "1.2",
        "Date" | "DateOnly" | "TimeOnly" | "TimestampOffset" => "📅",
        "Geometry" => "📐",
        "OID" => "🔑",
        "GlobalID" | "GUID" => "🆔",
        "Blob" => "📦",
        "Raster" => "🖼",
        _ => "•",
    }
}
