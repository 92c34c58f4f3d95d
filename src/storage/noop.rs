use super::{DurableStorage, StorageKey, StorageKind};

/// Storage that keeps nothing; every read misses
pub struct NoopStorage;

#[async_trait::async_trait]
impl DurableStorage for NoopStorage {
    async fn get(&self, _key: &StorageKey) -> Option<String> {
        None
    }

    fn set(&self, _key: &StorageKey, _value: String) {}

    fn remove(&self, _key: &StorageKey) {}

    fn kind(&self) -> StorageKind {
        StorageKind::Noop
    }
}
