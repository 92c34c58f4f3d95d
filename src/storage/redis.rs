use std::time::Duration;

use redis::AsyncCommands;
use redis::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{DurableStorage, StorageKey, StorageKind};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Message for asynchronous storage writes
enum WriteOp {
    Set { key: String, value: String },
    Remove { key: String },
}

/// Redis-backed session storage
///
/// Writes go through a channel to a background task so mutations never wait on
/// Redis. The single writer keeps writes to one key in submission order.
#[derive(Clone)]
pub struct RedisStorage {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<WriteOp>,
}

/// Handle for gracefully shutting down the storage writer
pub struct RedisWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RedisWriterHandle {
    /// Signals the writer task and waits until pending writes are flushed.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Storage writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Storage writer task failed");
        }
    }
}

impl RedisStorage {
    /// Opens a client and verifies the server answers a PING before spawning the writer.
    pub async fn connect(redis_url: &str) -> anyhow::Result<(Self, RedisWriterHandle)> {
        let client = Client::open(redis_url)?;

        let mut conn = tokio::time::timeout(PROBE_TIMEOUT, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| anyhow::anyhow!("Redis connection timed out"))??;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        Ok(Self::new(client))
    }

    /// Creates the storage and spawns its background writer
    pub fn new(redis_client: Client) -> (Self, RedisWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let task = tokio::spawn(async move {
            Self::writer_task(client, write_rx, shutdown_rx).await;
        });

        let storage = Self {
            redis_client,
            write_tx,
        };

        (storage, RedisWriterHandle { shutdown_tx, task })
    }

    async fn writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<WriteOp>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Storage writer task started");

        loop {
            tokio::select! {
                Some(op) = write_rx.recv() => {
                    if let Err(e) = Self::apply(&client, op).await {
                        tracing::warn!(error = %e, "Failed to write session state to Redis");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    while let Some(op) = write_rx.recv().await {
                        if let Err(e) = Self::apply(&client, op).await {
                            tracing::warn!(error = %e, "Failed to flush storage write during shutdown");
                        }
                    }

                    tracing::info!("Storage writer task stopped");
                    break;
                }
            }
        }
    }

    async fn apply(client: &Client, op: WriteOp) -> redis::RedisResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        match op {
            WriteOp::Set { key, value } => conn.set(key, value).await,
            WriteOp::Remove { key } => conn.del(key).await,
        }
    }

    async fn read(&self, key: &StorageKey) -> redis::RedisResult<Option<String>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        conn.get(key.to_string()).await
    }

    fn send(&self, op: WriteOp) {
        if self.write_tx.send(op).is_err() {
            tracing::warn!("Storage writer is gone; dropping write");
        }
    }
}

#[async_trait::async_trait]
impl DurableStorage for RedisStorage {
    async fn get(&self, key: &StorageKey) -> Option<String> {
        self.read(key).await.unwrap_or_else(|e| {
            tracing::warn!(key = %key, error = %e, "Redis read failed");
            None
        })
    }

    fn set(&self, key: &StorageKey, value: String) {
        self.send(WriteOp::Set {
            key: key.to_string(),
            value,
        });
    }

    fn remove(&self, key: &StorageKey) {
        self.send(WriteOp::Remove {
            key: key.to_string(),
        });
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Redis
    }
}
