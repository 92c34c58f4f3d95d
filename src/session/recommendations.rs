use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    models::CatalogRecord,
    storage::{load_json, store_json, DurableStorage, StorageKey},
};

/// Last successful recommendation list, replaced wholesale
pub struct RecommendationStore {
    records: RwLock<Vec<CatalogRecord>>,
    storage: Arc<dyn DurableStorage>,
    key: StorageKey,
}

impl RecommendationStore {
    pub async fn restore(storage: Arc<dyn DurableStorage>, session: &str) -> Self {
        let key = StorageKey::Recommendations(session.to_string());
        let records: Vec<CatalogRecord> =
            load_json(storage.as_ref(), &key).await.unwrap_or_default();

        Self {
            records: RwLock::new(records),
            storage,
            key,
        }
    }

    pub async fn set_recommendations(&self, records: Vec<CatalogRecord>) {
        let mut current = self.records.write().await;
        *current = records;
        store_json(self.storage.as_ref(), &self.key, &*current, current.is_empty());
    }

    pub async fn reset(&self) {
        self.set_recommendations(Vec::new()).await;
    }

    pub async fn recommendations(&self) -> Vec<CatalogRecord> {
        self.records.read().await.clone()
    }
}
