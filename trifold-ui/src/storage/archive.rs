//! JSON archive history store
//!
//! The browser-localStorage analog: the whole history lives in one
//! versioned JSON file under the root folder, human-readable and easy
//! to copy around. Writes go through a temp file plus rename so a
//! crash never leaves a torn archive, and a mutex serializes the
//! read-modify-write cycles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use trifold_common::model::{HistoryItem, RatingCategory};
use trifold_common::{Error, Result};

/// Archive file format version
const ARCHIVE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveFile {
    version: u32,
    items: Vec<HistoryItem>,
}

/// History store backed by a single JSON file.
#[derive(Clone)]
pub struct ArchiveStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl ArchiveStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every item. A missing file reads as empty.
    async fn read_items(&self) -> Result<Vec<HistoryItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let archive: ArchiveFile = serde_json::from_str(&content)?;

        if archive.version != ARCHIVE_VERSION {
            return Err(Error::Config(format!(
                "unsupported archive version {} in {}",
                archive.version,
                self.path.display()
            )));
        }

        Ok(archive.items)
    }

    /// Write every item through a temp file plus rename.
    async fn write_items(&self, items: Vec<HistoryItem>) -> Result<()> {
        let archive = ArchiveFile {
            version: ARCHIVE_VERSION,
            items,
        };
        let content = serde_json::to_string_pretty(&archive)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    /// All history items, newest first.
    pub async fn list(&self) -> Result<Vec<HistoryItem>> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    /// One item by id.
    pub async fn get(&self, id: &str) -> Result<Option<HistoryItem>> {
        let _guard = self.lock.lock().await;
        let items = self.read_items().await?;
        Ok(items.into_iter().find(|item| item.id == id))
    }

    /// Whether an item with this id exists.
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let items = self.read_items().await?;
        Ok(items.iter().any(|item| item.id == id))
    }

    /// Insert or replace one item, keyed by id.
    pub async fn upsert(&self, item: &HistoryItem) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;

        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }

        self.write_items(items).await
    }

    /// Delete one item; reports whether it existed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;

        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }

        self.write_items(items).await?;
        Ok(true)
    }

    /// Remove the archive file entirely.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Set one rating category on one response.
    ///
    /// A `value` of None returns the category to unknown.
    pub async fn set_rating(
        &self,
        id: &str,
        response_index: usize,
        category: RatingCategory,
        value: Option<bool>,
    ) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_items().await?;

        let item = items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::NotFound(format!("history item {}", id)))?;

        let response = item.responses.get_mut(response_index).ok_or_else(|| {
            Error::InvalidInput(format!("response index {} out of range", response_index))
        })?;

        response.rating.set(category, value);
        self.write_items(items).await
    }
}
