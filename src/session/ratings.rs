use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::RatingEntry,
    storage::{load_json, store_json, DurableStorage, StorageKey},
};

/// Ordered mapping from catalog id to rating, mirrored to durable storage
///
/// Insertion order is recency. Re-rating a book updates it in place.
pub struct RatingStore {
    entries: RwLock<Vec<RatingEntry>>,
    storage: Arc<dyn DurableStorage>,
    key: StorageKey,
}

impl RatingStore {
    /// Restores the stored history for `session`, or starts empty
    pub async fn restore(storage: Arc<dyn DurableStorage>, session: &str) -> Self {
        let key = StorageKey::Ratings(session.to_string());
        let entries: Vec<RatingEntry> = load_json(storage.as_ref(), &key).await.unwrap_or_default();

        Self {
            entries: RwLock::new(entries),
            storage,
            key,
        }
    }

    /// Inserts or overwrites a rating
    pub async fn set_rating(&self, catalog_id: i64, rating: i64) -> AppResult<()> {
        let entry = RatingEntry::new(catalog_id, rating)?;

        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|e| e.catalog_id == catalog_id) {
            Some(existing) => existing.rating = entry.rating,
            None => entries.push(entry),
        }
        self.persist(&entries);

        Ok(())
    }

    /// Removes a rating; unknown ids are ignored
    pub async fn clear_rating(&self, catalog_id: i64) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.catalog_id != catalog_id);
        if entries.len() != before {
            self.persist(&entries);
        }
    }

    pub async fn reset(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        self.persist(&entries);
    }

    /// Snapshot of the history, oldest first
    pub async fn history(&self) -> Vec<RatingEntry> {
        self.entries.read().await.clone()
    }

    fn persist(&self, entries: &[RatingEntry]) {
        store_json(self.storage.as_ref(), &self.key, &entries, entries.is_empty());
    }
}
