//! History migration between storage backends
//!
//! Copies every item from one backend into the other via upsert by
//! id, so repeated runs converge instead of duplicating. The source
//! is left untouched; wiping it afterwards is a separate, explicit
//! operation.

use serde::Serialize;
use trifold_common::model::StorageBackend;
use trifold_common::{Error, Result};

use super::StoreSet;

/// Outcome of one migration run.
#[derive(Debug, Serialize)]
pub struct MigrationReport {
    pub from: StorageBackend,
    pub to: StorageBackend,
    /// Number of items copied into the destination
    pub migrated: usize,
}

/// Copy all history items from one backend to the other.
pub async fn migrate(
    stores: &StoreSet,
    from: StorageBackend,
    to: StorageBackend,
) -> Result<MigrationReport> {
    if from == to {
        return Err(Error::InvalidInput(
            "source and destination backend are the same".to_string(),
        ));
    }

    let items = stores.list(from).await?;
    let migrated = items.len();

    for item in &items {
        stores.upsert(to, item).await?;
    }

    tracing::info!(from = %from, to = %to, migrated, "History migration complete");

    Ok(MigrationReport { from, to, migrated })
}
