//! On-demand enrichment of a single catalog entry.
//!
//! Details are never part of a catalog load. When the user opens an entry, the resolver
//! reads the field schema of exactly that object, and on the first view also fetches its
//! metadata document and derives the editor-tracking, archiving and date annotations.
//! Those annotations are written back into the entry, so later views only recompute the
//! field list.

use std::path::Path;

use log::{debug, warn};
use sdesearch_core_common::{
    DatasetKind, FieldDefinition, GeodatabaseSession, MetadataSource, SessionFactory,
};

use crate::error::DetailError;
use crate::metadata::ParsedMetadata;
use crate::model::{DatasetEntry, FieldEntry};
use crate::settings::Settings;

/// Audit fields maintained by editor tracking; all four must be present.
pub const EDITOR_TRACKING_FIELDS: [&str; 4] = [
    "created_user",
    "created_date",
    "last_edited_user",
    "last_edited_date",
];

/// Version-range fields added by archiving; both must be present.
pub const ARCHIVING_FIELDS: [&str; 2] = ["GDB_FROM_DATE", "GDB_TO_DATE"];

/// Detail view of one entry.
#[derive(Debug)]
pub struct DatasetDetails {
    /// Field rows, freshly read (empty for kinds without a schema)
    pub fields: Vec<FieldEntry>,
    /// Multi-line human-readable report
    pub report: String,
    /// Set when the schema could not be read
    pub error: Option<DetailError>,
}

/// Resolves the detail view of catalog entries.
pub struct DetailResolver<'a> {
    sessions: &'a dyn SessionFactory,
    metadata: &'a dyn MetadataSource,
    settings: &'a Settings,
}

impl<'a> DetailResolver<'a> {
    /// Creates a resolver.
    #[must_use]
    pub fn new(
        sessions: &'a dyn SessionFactory,
        metadata: &'a dyn MetadataSource,
        settings: &'a Settings,
    ) -> Self {
        Self {
            sessions,
            metadata,
            settings,
        }
    }

    /// Resolves the details of `entry`, enriching it in place on the first view.
    ///
    /// Failures never propagate: a schema that cannot be read yields no fields and a
    /// report describing the error, and metadata problems only leave the entry without
    /// metadata.
    pub async fn resolve(&self, entry: &mut DatasetEntry) -> DatasetDetails {
        let mut schema: Option<(Box<dyn GeodatabaseSession>, Vec<FieldDefinition>)> = None;

        if entry.kind.has_schema() {
            match self.open_schema(&entry.connection_path, entry.kind, &entry.name).await {
                Ok(opened) => schema = Some(opened),
                Err(source) => {
                    let report = format!("Error loading details: {source}");
                    let error = DetailError::SchemaUnavailable {
                        name: entry.name.clone(),
                        source,
                    };
                    warn!("{error}");
                    return DatasetDetails {
                        fields: Vec::new(),
                        report,
                        error: Some(error),
                    };
                },
            }
        }

        if !entry.metadata.has_metadata {
            self.enrich(entry).await;
        }
        if let Some((session, definitions)) = schema.as_ref() {
            if !entry.flags_resolved {
                derive_flags(entry, session.as_ref(), definitions).await;
            }
        }

        let fields: Vec<FieldEntry> = schema
            .as_ref()
            .map(|(_, definitions)| {
                definitions
                    .iter()
                    .map(|d| FieldEntry::from_definition(d, self.settings.domain_preview_limit))
                    .collect()
            })
            .unwrap_or_default();
        if schema.is_some() {
            entry.field_count = fields.len();
        }

        DatasetDetails {
            fields,
            report: build_report(entry),
            error: None,
        }
    }

    async fn open_schema(
        &self,
        connection_path: &Path,
        kind: DatasetKind,
        name: &str,
    ) -> anyhow::Result<(Box<dyn GeodatabaseSession>, Vec<FieldDefinition>)> {
        let session = self.sessions.open(connection_path).await?;
        let definition = session.get_definition(kind, name).await?;
        let fields = definition.fields()?;
        Ok((session, fields))
    }

    /// Fetches metadata and the dates it carries. Runs until metadata is found.
    async fn enrich(&self, entry: &mut DatasetEntry) {
        match self
            .metadata
            .metadata_xml(&entry.connection_path, &entry.name)
            .await
        {
            Ok(Some(xml)) if !xml.trim().is_empty() => {
                entry.metadata.has_metadata = true;
                match ParsedMetadata::parse(&xml) {
                    Ok(parsed) => {
                        parsed.apply_to(&mut entry.metadata, self.settings.snippet_budget);
                        entry.created = parsed.created;
                        entry.modified = parsed.modified;
                    },
                    Err(e) => debug!("Unparseable metadata for {}: {e}", entry.name),
                }
                entry.metadata.raw = xml;
            },
            Ok(_) => debug!("No metadata for {}", entry.name),
            Err(e) => debug!("Metadata error for {}: {e}", entry.name),
        }
    }
}

/// Derives editor tracking and archiving once per entry, falling back to an archive
/// status query when the archiving fields are absent.
async fn derive_flags(
    entry: &mut DatasetEntry,
    session: &dyn GeodatabaseSession,
    fields: &[FieldDefinition],
) {
    entry.editor_tracking = has_fields(fields, &EDITOR_TRACKING_FIELDS);
    entry.archiving = has_fields(fields, &ARCHIVING_FIELDS);
    if !entry.archiving {
        match session.is_archived(&entry.name).await {
            Ok(archived) => entry.archiving = archived,
            Err(e) => debug!("Archive status of {} unavailable: {e}", entry.name),
        }
    }
    entry.flags_resolved = true;
}

/// Returns `true` if every name in `required` is a field name, ignoring case.
#[must_use]
pub fn has_fields(fields: &[FieldDefinition], required: &[&str]) -> bool {
    required
        .iter()
        .all(|name| fields.iter().any(|f| f.name.eq_ignore_ascii_case(name)))
}

/// Assembles the multi-line detail report of an entry.
#[must_use]
pub fn build_report(entry: &DatasetEntry) -> String {
    let mut lines = vec![
        format!("Full Name: {}", entry.name),
        format!("Type: {}", entry.kind),
    ];

    if let Some(alias) = entry
        .alias
        .as_deref()
        .filter(|a| !a.trim().is_empty() && *a != entry.simple_name)
    {
        lines.push(format!("Alias: {alias}"));
    }
    if let Some(geometry) = non_blank(entry.geometry_type.as_deref()) {
        lines.push(format!("Geometry: {geometry}"));
    }
    if let Some(sr) = non_blank(entry.spatial_reference.as_deref()) {
        lines.push(format!("Spatial Reference: {sr}"));
    }
    if entry.field_count > 0 {
        lines.push(format!("Fields: {}", entry.field_count));
    }

    let flags: Vec<&str> = [
        (entry.editor_tracking, "Editor Tracking"),
        (entry.archiving, "Archiving"),
    ]
    .into_iter()
    .filter_map(|(on, label)| on.then_some(label))
    .collect();
    if !flags.is_empty() {
        lines.push(format!("Enabled: {}", flags.join(", ")));
    }
    if let Some(created) = entry.created {
        lines.push(format!("Created: {}", created.format("%Y-%m-%d")));
    }
    if let Some(modified) = entry.modified {
        lines.push(format!("Modified: {}", modified.format("%Y-%m-%d")));
    }

    let metadata = &entry.metadata;
    if metadata.has_metadata {
        let mut shown: Vec<&str> = Vec::new();
        let blocks = [
            ("Description:\n", metadata.description.as_str(), true),
            ("Summary:\n", metadata.summary.as_str(), true),
            ("Purpose:\n", metadata.purpose.as_str(), true),
            ("Tags: ", metadata.tags.as_str(), false),
            ("Credits: ", metadata.credits.as_str(), false),
            ("Use Constraints: ", metadata.use_constraints.as_str(), false),
        ];
        for (heading, text, narrative) in blocks {
            if text.trim().is_empty() || (narrative && shown.contains(&text)) {
                continue;
            }
            if narrative {
                shown.push(text);
            }
            lines.push(format!("\n{heading}{text}"));
        }
    } else {
        lines.push("\n(No metadata available for this item)".to_string());
    }

    lines.join("\n")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::Path;

    fn field(name: &str) -> FieldDefinition {
        FieldDefinition::new(name, "String")
    }

    #[test]
    fn test_editor_tracking_requires_all_four_fields() {
        let mut fields: Vec<_> = EDITOR_TRACKING_FIELDS
            .iter()
            .map(|n| field(&n.to_uppercase()))
            .collect();
        assert!(has_fields(&fields, &EDITOR_TRACKING_FIELDS));
        fields.pop();
        assert!(!has_fields(&fields, &EDITOR_TRACKING_FIELDS));
    }

    #[test]
    fn test_report_without_metadata() {
        let mut entry = DatasetEntry::new("GIS.ROADS", DatasetKind::FeatureClass, Path::new("c.sde"));
        entry.alias = Some("ROADS".to_string());
        entry.set_geometry_type(Some("Polyline".to_string()));
        entry.field_count = 3;
        assert_eq!(
            build_report(&entry),
            "Full Name: GIS.ROADS\nType: Feature Class\nGeometry: Polyline\nFields: 3\n\n(No metadata available for this item)"
        );
    }

    #[test]
    fn test_report_skips_duplicate_blocks() {
        let mut entry = DatasetEntry::new("GIS.ROADS", DatasetKind::Table, Path::new("c.sde"));
        entry.alias = Some("Road table".to_string());
        entry.editor_tracking = true;
        entry.created = Some(Utc.with_ymd_and_hms(2021, 3, 4, 0, 0, 0).unwrap());
        entry.metadata.has_metadata = true;
        entry.metadata.description = "Routing".to_string();
        entry.metadata.summary = "Routing".to_string();
        entry.metadata.purpose = "Routing".to_string();
        entry.metadata.tags = "roads".to_string();

        let report = build_report(&entry);
        assert!(report.contains("Alias: Road table\n"));
        assert!(report.contains("Enabled: Editor Tracking\n"));
        assert!(report.contains("Created: 2021-03-04"));
        assert_eq!(report.matches("Routing").count(), 1);
        assert!(report.ends_with("\n\nDescription:\nRouting\n\nTags: roads"));
    }
}
