use std::sync::Arc;

use wrecksys::{
    api::{create_router, AppState},
    db::{create_pool, run_migrations, SqliteCatalogStore},
    init_tracing,
    services::ModelServingClient,
    storage::select_storage,
    Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    if config.run_migrations {
        run_migrations(&pool).await?;
    }

    let recommender = ModelServingClient::new(config.predict_url.clone(), config.predict_timeout())?;
    let (storage, writer) = select_storage(&config).await;

    let state = AppState::new(
        Arc::new(SqliteCatalogStore::new(pool)),
        Arc::new(recommender),
        storage,
        config.max_sessions,
    )?;

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    if let Some(writer) = writer {
        writer.shutdown().await;
    }

    Ok(())
}
