use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use sdesearch_core::cache::DiskCache;
use sdesearch_core::details::DetailResolver;
use sdesearch_core::loader::{CatalogLoader, ProgressReporter};
use sdesearch_core::model::{ConnectionDescriptor, ConnectionOrigin, DomainKind};
use sdesearch_core::settings::Settings;
use sdesearch_core_common::{DatasetKind, SessionFactory};
use sdesearch_snapshot::SnapshotSessionFactory;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/Prod.json")
}

/// Lays out `Prod.sde` with its sidecar snapshot in a temporary folder.
fn connection_with_sidecar(dir: &TempDir) -> Result<ConnectionDescriptor> {
    let sde = dir.path().join("Prod.sde");
    fs::write(&sde, b"")?;
    fs::copy(fixture(), dir.path().join("Prod.json"))?;
    Ok(ConnectionDescriptor::from_path(sde, ConnectionOrigin::ProfileFolder))
}

/// Test loading a catalog from a sidecar snapshot
#[tokio::test]
async fn test_load_catalog_from_sidecar() -> Result<()> {
    let dir = TempDir::new()?;
    let conn = connection_with_sidecar(&dir)?;
    let settings = Settings::default().with_cache_dir(dir.path().join("cache"));
    let cache = DiskCache::from_settings(&settings);
    let factory = SnapshotSessionFactory::sidecar();

    let outcome = CatalogLoader::new(&factory, &cache, &settings)
        .load(&conn, false, &ProgressReporter::silent())
        .await;

    assert!(outcome.is_complete());
    assert_eq!(
        outcome.status,
        "Prod: 2 feature classes, 1 tables, 1 datasets, 1 relationships"
    );
    let names: Vec<_> = outcome
        .catalog
        .datasets
        .iter()
        .map(|e| e.simple_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Parcels", "Roads_2020", "Owners", "Transportation", "ParcelOwner"]
    );
    assert_eq!(outcome.catalog.datasets[1].subtitle(), "Feature Class · Polyline · 7 fields");
    assert!(cache.file_for(&conn.path).exists());
    Ok(())
}

/// Test resolving details through a snapshot
#[tokio::test]
async fn test_resolve_details_from_snapshot() -> Result<()> {
    let dir = TempDir::new()?;
    let conn = connection_with_sidecar(&dir)?;
    let settings = Settings::default().with_cache_dir(dir.path().join("cache"));
    let cache = DiskCache::from_settings(&settings);
    let factory = SnapshotSessionFactory::sidecar();

    let mut catalog = CatalogLoader::new(&factory, &cache, &settings)
        .load(&conn, false, &ProgressReporter::silent())
        .await
        .catalog;
    let resolver = DetailResolver::new(&factory, &factory, &settings);

    let roads = &mut catalog.datasets[1];
    let details = resolver.resolve(roads).await;
    assert!(roads.editor_tracking);
    assert!(roads.metadata.has_metadata);
    assert!(roads.created.is_some());
    let class = details
        .fields
        .iter()
        .find(|f| f.name == "CLASS")
        .and_then(|f| f.domain.clone())
        .ok_or_else(|| anyhow::anyhow!("CLASS domain missing"))?;
    assert_eq!(class.kind, DomainKind::CodedValue);
    assert_eq!(
        class.preview,
        "1=Highway, 2=Arterial, 3=Collector, 4=Local, 5=Alley (+1 more)"
    );
    assert!(details.report.contains("Alias: Roads 2020"));

    let parcels = &mut catalog.datasets[0];
    resolver.resolve(parcels).await;
    assert!(parcels.archiving);

    let owners = &mut catalog.datasets[2];
    let details = resolver.resolve(owners).await;
    assert!(owners.archiving);
    assert_eq!(details.fields[1].summary(), "Double [Percent]");
    Ok(())
}

/// Test that a missing snapshot is a connection failure
#[tokio::test]
async fn test_missing_snapshot_fails_to_open() -> Result<()> {
    let dir = TempDir::new()?;
    let factory = SnapshotSessionFactory::sidecar();
    let result = factory.open(&dir.path().join("Nowhere.sde")).await;
    assert!(result.is_err());

    let explicit = SnapshotSessionFactory::from_file(fixture());
    let session = explicit.open(&dir.path().join("Anything.sde")).await?;
    assert_eq!(session.list_definitions(DatasetKind::Table).await?.len(), 3);
    Ok(())
}
