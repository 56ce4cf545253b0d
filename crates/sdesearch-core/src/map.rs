//! Adding catalog entries to the host's map.

use log::info;
use sdesearch_core_common::{DatasetKind, MapSink};

use crate::error::{DetailError, InputError, Result};
use crate::model::DatasetEntry;

/// Adds `entry` to the map behind `sink`: feature classes as layers, tables as
/// standalone tables.
///
/// Returns the status line to show on success.
///
/// # Errors
///
/// Returns [`InputError::NotMappable`] for kinds that cannot be added to a map, and
/// [`DetailError::MapAdd`] if the sink fails.
pub async fn add_to_map(entry: &DatasetEntry, sink: &dyn MapSink) -> Result<String> {
    let uri = entry.dataset_uri();
    let added = match entry.kind {
        DatasetKind::FeatureClass if entry.can_add_to_map => sink.add_layer(&uri).await,
        DatasetKind::Table if entry.can_add_to_map => sink.add_standalone_table(&uri).await,
        kind => {
            return Err(InputError::NotMappable {
                name: entry.name.clone(),
                kind,
            }
            .into());
        },
    };

    added.map_err(|source| DetailError::MapAdd {
        name: entry.name.clone(),
        source,
    })?;
    info!("Added {uri} to map");
    Ok(format!("✓ Added \"{}\" to map", entry.simple_name))
}
