mod common;

use std::fs;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use common::{CallCounters, FakeDefinition, FakeGeodatabase};
use sdesearch_core::SearchSession;
use sdesearch_core::details::{DetailResolver, EDITOR_TRACKING_FIELDS};
use sdesearch_core::filter::{SearchScopes, TypeVisibility};
use sdesearch_core::model::DatasetEntry;
use sdesearch_core::settings::{CONNECTIONS_FOLDER, Settings};
use sdesearch_core_common::{DatasetKind, MapSink, ProjectItem};
use tempfile::TempDir;

const ROADS_METADATA: &str = r"<metadata>
  <Esri><CreaDate>20200110</CreaDate><ModDate>20240301</ModDate></Esri>
  <dataIdInfo>
    <idAbs>County road centerlines</idAbs>
    <idPurp>Routing</idPurp>
    <searchKeys><keyword>transportation</keyword></searchKeys>
  </dataIdInfo>
</metadata>";

fn roads() -> FakeDefinition {
    let mut fields: Vec<&str> = EDITOR_TRACKING_FIELDS.to_vec();
    fields.push("NAME");
    FakeDefinition::feature_class("GIS.ROADS", "Polyline", &fields)
}

fn geodatabase() -> FakeGeodatabase {
    FakeGeodatabase::builder()
        .with(DatasetKind::FeatureClass, roads())
        .with(DatasetKind::Table, FakeDefinition::table("GIS.OWNERS", &["GDB_FROM_DATE"]))
        .with(DatasetKind::FeatureDataset, FakeDefinition::named("GIS.Transport"))
        .metadata("GIS.ROADS", ROADS_METADATA)
        .archived("GIS.OWNERS")
        .build()
}

/// Metadata is fetched on the first detail view only; fields every time
#[tokio::test]
async fn test_details_fetch_metadata_once() -> Result<()> {
    let dir = TempDir::new()?;
    let gdb = geodatabase();
    let settings = Settings::default().with_cache_dir(dir.path());
    let resolver = DetailResolver::new(&gdb, &gdb, &settings);
    let mut entry = DatasetEntry::new(
        "GIS.ROADS",
        DatasetKind::FeatureClass,
        &dir.path().join("prod.sde"),
    );

    let first = resolver.resolve(&mut entry).await;
    assert!(first.error.is_none());
    assert_eq!(first.fields.len(), 6);
    assert!(entry.metadata.has_metadata);
    assert_eq!(entry.metadata.description, "County road centerlines");
    assert_eq!(
        entry.metadata.snippet,
        "County road centerlines | Tags: transportation"
    );
    assert!(entry.editor_tracking);
    assert!(!entry.archiving);
    assert!(entry.created.is_some());
    assert!(first.report.contains("Enabled: Editor Tracking"));
    assert!(first.report.contains("\nDescription:\nCounty road centerlines"));
    assert!(first.report.contains("\nSummary:\nRouting"));
    assert!(!first.report.contains("Purpose:"));

    let second = resolver.resolve(&mut entry).await;
    assert_eq!(second.fields.len(), 6);
    assert_eq!(second.report, first.report);
    assert_eq!(CallCounters::get(&gdb.counters().metadata_fetches), 1);
    assert_eq!(CallCounters::get(&gdb.counters().archive_queries), 1);
    assert_eq!(CallCounters::get(&gdb.counters().get_definitions), 2);
    Ok(())
}

/// Archiving falls back to an explicit status query when the fields are absent
#[tokio::test]
async fn test_archiving_falls_back_to_status_query() -> Result<()> {
    let dir = TempDir::new()?;
    let gdb = geodatabase();
    let settings = Settings::default().with_cache_dir(dir.path());
    let resolver = DetailResolver::new(&gdb, &gdb, &settings);
    let mut entry = DatasetEntry::new("GIS.OWNERS", DatasetKind::Table, &dir.path().join("prod.sde"));

    let details = resolver.resolve(&mut entry).await;
    assert!(entry.archiving);
    assert!(!entry.editor_tracking);
    assert!(!entry.metadata.has_metadata);
    assert!(details.report.ends_with("(No metadata available for this item)"));
    Ok(())
}

/// Without metadata the lookup is retried on every view, but the flags are derived once
#[tokio::test]
async fn test_flags_are_derived_once_without_metadata() -> Result<()> {
    let dir = TempDir::new()?;
    let gdb = geodatabase();
    let settings = Settings::default().with_cache_dir(dir.path());
    let resolver = DetailResolver::new(&gdb, &gdb, &settings);
    let mut entry = DatasetEntry::new("GIS.OWNERS", DatasetKind::Table, &dir.path().join("prod.sde"));

    resolver.resolve(&mut entry).await;
    let second = resolver.resolve(&mut entry).await;
    assert!(entry.archiving);
    assert!(entry.flags_resolved);
    assert!(second.report.ends_with("(No metadata available for this item)"));
    assert_eq!(CallCounters::get(&gdb.counters().metadata_fetches), 2);
    assert_eq!(CallCounters::get(&gdb.counters().archive_queries), 1);
    Ok(())
}

/// A schema that cannot be opened yields no fields and an error report
#[tokio::test]
async fn test_missing_schema_reports_error() -> Result<()> {
    let dir = TempDir::new()?;
    let gdb = geodatabase();
    let settings = Settings::default().with_cache_dir(dir.path());
    let resolver = DetailResolver::new(&gdb, &gdb, &settings);
    let mut entry = DatasetEntry::new("GIS.GONE", DatasetKind::Table, &dir.path().join("prod.sde"));

    let details = resolver.resolve(&mut entry).await;
    assert!(details.fields.is_empty());
    assert!(details.error.is_some());
    assert_eq!(details.report, "Error loading details: GIS.GONE does not exist");
    assert_eq!(CallCounters::get(&gdb.counters().metadata_fetches), 0);
    Ok(())
}

/// Kinds without a schema only get metadata
#[tokio::test]
async fn test_feature_dataset_details() -> Result<()> {
    let dir = TempDir::new()?;
    let gdb = geodatabase();
    let settings = Settings::default().with_cache_dir(dir.path());
    let resolver = DetailResolver::new(&gdb, &gdb, &settings);
    let mut entry = DatasetEntry::new(
        "GIS.Transport",
        DatasetKind::FeatureDataset,
        &dir.path().join("prod.sde"),
    );

    let details = resolver.resolve(&mut entry).await;
    assert!(details.fields.is_empty());
    assert!(details.report.starts_with("Full Name: GIS.Transport\nType: Feature Dataset"));
    assert_eq!(CallCounters::get(&gdb.counters().opens), 0);
    Ok(())
}

#[derive(Default)]
struct RecordingMap {
    added: Mutex<Vec<String>>,
}

#[async_trait]
impl MapSink for RecordingMap {
    async fn add_layer(&self, uri: &str) -> Result<()> {
        self.added.lock().unwrap().push(format!("layer {uri}"));
        Ok(())
    }

    async fn add_standalone_table(&self, uri: &str) -> Result<()> {
        self.added.lock().unwrap().push(format!("table {uri}"));
        Ok(())
    }
}

/// The panel session drives discovery, loading, filtering, details and map adds
#[tokio::test]
async fn test_search_session_workflow() -> Result<()> {
    let dir = TempDir::new()?;
    let connections = dir.path().join(CONNECTIONS_FOLDER);
    fs::create_dir_all(&connections)?;
    fs::write(connections.join("Prod.sde"), b"")?;

    let gdb = Arc::new(geodatabase());
    let settings = Settings::default()
        .with_cache_dir(dir.path().join("cache"))
        .with_project_home(dir.path())
        .with_profile_connections_dir(None);
    let mut session = SearchSession::new(
        settings,
        gdb.clone(),
        gdb.clone(),
        Arc::new(Vec::<ProjectItem>::new()),
    );

    session.refresh_connections().await?;
    assert_eq!(session.status(), "1 connection(s) found — select one to browse");
    let conn = session
        .selected_connection()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("single connection not auto-selected"))?;

    let outcome = session.load_catalog(&conn, false).await?;
    assert!(outcome.is_complete());
    assert_eq!(
        session.status(),
        "Prod: 1 feature classes, 1 tables, 1 datasets, 0 relationships"
    );

    assert_eq!(session.set_query("roads")?, 1);
    assert_eq!(session.status(), "Found 1 of 3 items matching \"roads\"");

    session.set_scopes(SearchScopes {
        by_name: true,
        by_metadata: true,
    })?;
    assert_eq!(session.set_query("transportation")?, 0);
    session.resolve_details("gis.roads").await?;
    assert_eq!(session.set_query("transportation")?, 1);

    session.set_visibility(TypeVisibility {
        feature_classes: false,
        ..TypeVisibility::default()
    })?;
    assert!(session.results().is_empty());

    session.clear_search();
    assert_eq!(session.status(), "Showing all 3 items");
    assert_eq!(session.results().len(), 2);

    let map = RecordingMap::default();
    let status = session.add_to_map("GIS.OWNERS", &map).await?;
    assert_eq!(status, "✓ Added \"OWNERS\" to map");
    assert!(session.add_to_map("GIS.Transport", &map).await.is_err());
    assert_eq!(map.added.lock().unwrap().len(), 1);
    assert!(!session.is_busy());
    Ok(())
}
