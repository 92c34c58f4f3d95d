use dashmap::DashMap;

use super::{DurableStorage, StorageKey, StorageKind};

/// Process-scoped storage; survives across requests but not restarts
#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DurableStorage for MemoryStorage {
    async fn get(&self, key: &StorageKey) -> Option<String> {
        self.entries.get(&key.to_string()).map(|v| v.value().clone())
    }

    fn set(&self, key: &StorageKey, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &StorageKey) {
        self.entries.remove(&key.to_string());
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Memory
    }
}
