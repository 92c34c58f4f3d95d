use serde::Deserialize;
use std::time::Duration;

/// Preferred durable backend for session state
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Redis,
    Memory,
    None,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite catalog database URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Apply bundled migrations on startup
    #[serde(default)]
    pub run_migrations: bool,

    /// Preferred session storage backend
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Model-serving prediction endpoint
    #[serde(default = "default_predict_url")]
    pub predict_url: String,

    /// Prediction request timeout in seconds
    #[serde(default = "default_predict_timeout_secs")]
    pub predict_timeout_secs: u64,

    /// Live sessions held in memory before the least recently used is evicted
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_database_url() -> String {
    "sqlite://assets/app.db".to_string()
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Redis
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_predict_url() -> String {
    "http://serving:8501/v1/models/wrecksys:predict".to_string()
}

fn default_predict_timeout_secs() -> u64 {
    10
}

fn default_max_sessions() -> usize {
    crate::session::DEFAULT_MAX_SESSIONS
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn predict_timeout(&self) -> Duration {
        Duration::from_secs(self.predict_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
