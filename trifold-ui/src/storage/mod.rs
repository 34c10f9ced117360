//! History storage backends
//!
//! Two interchangeable stores hold the same `HistoryItem` shape: the
//! SQLite database and a JSON archive file. `StoreSet` owns one of
//! each and dispatches on the requested backend, so handlers never
//! care which one is active.

pub mod archive;
pub mod migrate;
pub mod sqlite;
pub mod validate;

pub use archive::ArchiveStore;
pub use migrate::{migrate, MigrationReport};
pub use sqlite::SqliteStore;
pub use validate::{validate_items, ValidationIssue, ValidationReport, MAX_RESPONSES};

use trifold_common::model::{HistoryItem, RatingCategory, StorageBackend};
use trifold_common::Result;

/// Both history stores, dispatched by backend.
#[derive(Clone)]
pub struct StoreSet {
    sqlite: SqliteStore,
    archive: ArchiveStore,
}

impl StoreSet {
    pub fn new(sqlite: SqliteStore, archive: ArchiveStore) -> Self {
        Self { sqlite, archive }
    }

    /// The archive store, for path reporting
    pub fn archive(&self) -> &ArchiveStore {
        &self.archive
    }

    /// All items from one backend, newest first
    pub async fn list(&self, backend: StorageBackend) -> Result<Vec<HistoryItem>> {
        match backend {
            StorageBackend::Database => self.sqlite.list().await,
            StorageBackend::Archive => self.archive.list().await,
        }
    }

    /// One item by id
    pub async fn get(&self, backend: StorageBackend, id: &str) -> Result<Option<HistoryItem>> {
        match backend {
            StorageBackend::Database => self.sqlite.get(id).await,
            StorageBackend::Archive => self.archive.get(id).await,
        }
    }

    /// Whether an item with this id exists
    pub async fn exists(&self, backend: StorageBackend, id: &str) -> Result<bool> {
        match backend {
            StorageBackend::Database => self.sqlite.exists(id).await,
            StorageBackend::Archive => self.archive.exists(id).await,
        }
    }

    /// Insert or replace one item, keyed by id
    pub async fn upsert(&self, backend: StorageBackend, item: &HistoryItem) -> Result<()> {
        match backend {
            StorageBackend::Database => self.sqlite.upsert(item).await,
            StorageBackend::Archive => self.archive.upsert(item).await,
        }
    }

    /// Delete one item; reports whether it existed
    pub async fn delete(&self, backend: StorageBackend, id: &str) -> Result<bool> {
        match backend {
            StorageBackend::Database => self.sqlite.delete(id).await,
            StorageBackend::Archive => self.archive.delete(id).await,
        }
    }

    /// Delete every item in one backend
    pub async fn clear(&self, backend: StorageBackend) -> Result<()> {
        match backend {
            StorageBackend::Database => self.sqlite.clear().await,
            StorageBackend::Archive => self.archive.clear().await,
        }
    }

    /// Set one rating category on one response of one item
    pub async fn set_rating(
        &self,
        backend: StorageBackend,
        id: &str,
        response_index: usize,
        category: RatingCategory,
        value: Option<bool>,
    ) -> Result<()> {
        match backend {
            StorageBackend::Database => {
                self.sqlite.set_rating(id, response_index, category, value).await
            }
            StorageBackend::Archive => {
                self.archive.set_rating(id, response_index, category, value).await
            }
        }
    }

    /// Item count for one backend
    pub async fn count(&self, backend: StorageBackend) -> Result<usize> {
        match backend {
            StorageBackend::Database => self.sqlite.count().await,
            // The archive file is read whole no matter what
            StorageBackend::Archive => Ok(self.archive.list().await?.len()),
        }
    }
}
