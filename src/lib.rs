pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wrecksys=info,tower_http=info".into()),
        )
        .init();
}
