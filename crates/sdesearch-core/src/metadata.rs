//! Extraction of display fields from catalog metadata documents.
//!
//! Metadata documents come in two flavors: the current ArcGIS format (`dataIdInfo/...`)
//! and the legacy FGDC format (`idinfo/...`). Each display field is read through an
//! ordered list of element paths; the first path yielding non-blank text wins. Paths
//! match at any depth of the document, like `//a/b` in XPath.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use roxmltree::{Document, Node};

use crate::model::MetadataBlock;
use crate::utils::truncate_chars;

/// A single-valued display field of [`MetadataBlock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Description,
    Summary,
    Purpose,
    Credits,
    UseConstraints,
}

/// One extraction rule: candidate paths for one field, in order of preference.
struct ExtractionRule {
    field: TextField,
    paths: &'static [&'static str],
}

const TEXT_RULES: [ExtractionRule; 5] = [
    ExtractionRule {
        field: TextField::Description,
        paths: &["dataIdInfo/idAbs", "dataIdInfo/idPurp", "idinfo/descript/abstract"],
    },
    ExtractionRule {
        field: TextField::Summary,
        paths: &["dataIdInfo/idPurp", "idinfo/descript/purpose"],
    },
    ExtractionRule {
        field: TextField::Purpose,
        paths: &["dataIdInfo/idPurp"],
    },
    ExtractionRule {
        field: TextField::Credits,
        paths: &["dataIdInfo/idCredit", "idinfo/datacred"],
    },
    ExtractionRule {
        field: TextField::UseConstraints,
        paths: &["dataIdInfo/resConst/Consts/useLimit", "idinfo/useconst"],
    },
];

/// Keyword paths; every match of every path contributes a tag.
const TAG_PATHS: [&str; 2] = ["dataIdInfo/searchKeys/keyword", "idinfo/keywords/theme/themekey"];

const CREATED_PATHS: [&str; 3] = [
    "Esri/CreaDate",
    "dataIdInfo/idCitation/date/createDate",
    "dataIdInfo/idCitation/date/pubDate",
];

const MODIFIED_PATHS: [&str; 2] = ["Esri/ModDate", "dataIdInfo/idCitation/date/reviseDate"];

/// Display fields parsed from one metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMetadata {
    /// Abstract
    pub description: String,
    /// Summary
    pub summary: String,
    /// Purpose
    pub purpose: String,
    /// De-duplicated keywords, comma-separated
    pub tags: String,
    /// Credits
    pub credits: String,
    /// Use limitations
    pub use_constraints: String,
    /// Creation date
    pub created: Option<DateTime<Utc>>,
    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

impl ParsedMetadata {
    /// Parses a metadata document.
    ///
    /// # Errors
    ///
    /// Returns an error if `xml` is not well-formed.
    ///
    /// # Examples
    ///
    /// ```
    /// use sdesearch_core::metadata::ParsedMetadata;
    ///
    /// let xml = "<metadata><dataIdInfo><idAbs>Street centerlines</idAbs>\
    ///            <searchKeys><keyword>roads</keyword><keyword>Roads</keyword></searchKeys>\
    ///            </dataIdInfo></metadata>";
    /// let parsed = ParsedMetadata::parse(xml).unwrap();
    /// assert_eq!(parsed.description, "Street centerlines");
    /// assert_eq!(parsed.tags, "roads");
    /// ```
    pub fn parse(xml: &str) -> Result<Self, roxmltree::Error> {
        let doc = Document::parse(xml)?;
        let mut parsed = Self::default();

        for rule in &TEXT_RULES {
            let value = rule
                .paths
                .iter()
                .find_map(|path| first_text(&doc, path))
                .unwrap_or_default();
            *parsed.slot(rule.field) = value;
        }

        parsed.tags = collect_tags(&doc).join(", ");
        parsed.created = CREATED_PATHS
            .iter()
            .find_map(|path| first_text(&doc, path).and_then(|t| parse_metadata_date(&t)));
        parsed.modified = MODIFIED_PATHS
            .iter()
            .find_map(|path| first_text(&doc, path).and_then(|t| parse_metadata_date(&t)));

        Ok(parsed)
    }

    fn slot(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::Description => &mut self.description,
            TextField::Summary => &mut self.summary,
            TextField::Purpose => &mut self.purpose,
            TextField::Credits => &mut self.credits,
            TextField::UseConstraints => &mut self.use_constraints,
        }
    }

    /// Copies the text fields into `block` and derives its list snippet.
    ///
    /// An existing snippet is kept when there is nothing to derive one from.
    pub fn apply_to(&self, block: &mut MetadataBlock, snippet_budget: usize) {
        block.description.clone_from(&self.description);
        block.summary.clone_from(&self.summary);
        block.purpose.clone_from(&self.purpose);
        block.tags.clone_from(&self.tags);
        block.credits.clone_from(&self.credits);
        block.use_constraints.clone_from(&self.use_constraints);
        if let Some(snippet) = build_snippet(&self.description, &self.tags, snippet_budget) {
            block.snippet = snippet;
        }
    }
}

/// Builds the list snippet: truncated description, then a tags summary.
///
/// Returns `None` when both inputs are blank.
#[must_use]
pub fn build_snippet(description: &str, tags: &str, budget: usize) -> Option<String> {
    let mut parts = Vec::new();
    if !description.trim().is_empty() {
        parts.push(truncate_chars(description, budget));
    }
    if !tags.trim().is_empty() {
        parts.push(format!("Tags: {tags}"));
    }
    (!parts.is_empty()).then(|| parts.join(" | "))
}

/// Parses a date as found in metadata documents.
///
/// Accepts RFC 3339 timestamps, ISO dates with or without a time part, and compact
/// `yyyyMMdd` dates. Dates without a time are taken as midnight UTC.
///
/// # Examples
///
/// ```
/// use sdesearch_core::metadata::parse_metadata_date;
///
/// let compact = parse_metadata_date("20230115").unwrap();
/// let iso = parse_metadata_date("2023-01-15").unwrap();
/// assert_eq!(compact, iso);
/// assert!(parse_metadata_date("someday").is_none());
/// ```
#[must_use]
pub fn parse_metadata_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        let year = text[0..4].parse().ok()?;
        let month = text[4..6].parse().ok()?;
        let day = text[6..8].parse().ok()?;
        return midnight(NaiveDate::from_ymd_opt(year, month, day)?);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return midnight(date);
        }
    }
    None
}

fn midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

fn collect_tags(doc: &Document<'_>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for path in TAG_PATHS {
        for tag in all_texts(doc, path) {
            if seen.insert(tag.to_lowercase()) {
                tags.push(tag);
            }
        }
    }
    tags
}

/// Trimmed text of the first element matching `path`, if non-blank.
fn first_text(doc: &Document<'_>, path: &str) -> Option<String> {
    let steps: Vec<&str> = path.split('/').collect();
    doc.descendants()
        .find(|node| matches_path(*node, &steps))
        .map(inner_text)
        .filter(|text| !text.is_empty())
}

/// Trimmed, non-blank texts of every element matching `path`, in document order.
fn all_texts(doc: &Document<'_>, path: &str) -> Vec<String> {
    let steps: Vec<&str> = path.split('/').collect();
    doc.descendants()
        .filter(|node| matches_path(*node, &steps))
        .map(inner_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Returns `true` if `node` is the last step of `steps`, with its ancestors matching
/// the preceding steps in order.
fn matches_path(node: Node<'_, '_>, steps: &[&str]) -> bool {
    let mut current = Some(node);
    for step in steps.iter().rev() {
        match current {
            Some(n) if n.is_element() && n.tag_name().name() == *step => {
                current = n.parent_element();
            },
            _ => return false,
        }
    }
    true
}

/// Concatenated text content of `node` and its descendants, trimmed.
fn inner_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}
