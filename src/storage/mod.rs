//! Durable key-value storage for session state.
//!
//! Three interchangeable backends sit behind [`DurableStorage`]: Redis (durable across
//! restarts), an in-process map (lives as long as the server), and a no-op store. Storage
//! failures never surface as errors; callers keep working from their in-memory state.

use std::fmt::Display;
use std::sync::Arc;

use crate::config::{Config, StorageBackend};

pub mod memory;
pub mod noop;
pub mod redis;

pub use memory::MemoryStorage;
pub use noop::NoopStorage;
pub use redis::{RedisStorage, RedisWriterHandle};

/// Keys of the durable session cells
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Ratings(String),
    Recommendations(String),
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKey::Ratings(session) => write!(f, "session:{}:ratings", session),
            StorageKey::Recommendations(session) => write!(f, "session:{}:wrecks", session),
        }
    }
}

/// Which backend is live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Redis,
    Memory,
    Noop,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Redis => "redis",
            StorageKind::Memory => "memory",
            StorageKind::Noop => "none",
        }
    }
}

/// Storage port used by the session stores
///
/// Writes are fire-and-forget; reads return `None` both for missing keys and for
/// unavailable backends.
#[async_trait::async_trait]
pub trait DurableStorage: Send + Sync {
    async fn get(&self, key: &StorageKey) -> Option<String>;

    fn set(&self, key: &StorageKey, value: String);

    fn remove(&self, key: &StorageKey);

    fn kind(&self) -> StorageKind;
}

/// Reads and decodes a JSON value, discarding content that does not parse
pub async fn load_json<T: serde::de::DeserializeOwned>(
    storage: &dyn DurableStorage,
    key: &StorageKey,
) -> Option<T> {
    let raw = storage.get(key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding unreadable stored value");
            None
        }
    }
}

/// Encodes and writes a JSON value, or removes the key when `empty`
pub fn store_json<T: serde::Serialize>(
    storage: &dyn DurableStorage,
    key: &StorageKey,
    value: &T,
    empty: bool,
) {
    if empty {
        storage.remove(key);
        return;
    }

    match serde_json::to_string(value) {
        Ok(json) => storage.set(key, json),
        Err(e) => tracing::error!(key = %key, error = %e, "Storage serialization error"),
    }
}

/// Picks a backend once at startup, falling back redis → memory → none.
///
/// Returns the writer handle when Redis was selected so it can be flushed on shutdown.
pub async fn select_storage(
    config: &Config,
) -> (Arc<dyn DurableStorage>, Option<RedisWriterHandle>) {
    if config.storage_backend == StorageBackend::Redis {
        match RedisStorage::connect(&config.redis_url).await {
            Ok((storage, handle)) => {
                tracing::info!(backend = "redis", "Session storage selected");
                return (Arc::new(storage), Some(handle));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, falling back to memory storage");
            }
        }
    }

    if config.storage_backend != StorageBackend::None {
        tracing::info!(backend = "memory", "Session storage selected");
        return (Arc::new(MemoryStorage::new()), None);
    }

    tracing::warn!(backend = "none", "Session storage disabled; state will not persist");
    (Arc::new(NoopStorage), None)
}
