use std::sync::Arc;

use anyhow::Context;
use workspace_api::config::AppConfig;
use workspace_api::database::{MemoryStore, PgStore, Store};
use workspace_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    workspace_api::init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!("Starting Workspace API in {:?} mode", config.environment);

    let (store, pg): (Arc<dyn Store>, Option<Arc<PgStore>>) = match config.database.url.as_deref() {
        Some(url) => {
            let pg = Arc::new(
                PgStore::connect(url, &config.database)
                    .await
                    .context("failed to connect to database")?,
            );
            if config.database.run_migrations {
                pg.migrate().await.context("failed to run migrations")?;
            }
            let store: Arc<dyn Store> = pg.clone();
            (store, Some(pg))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on exit)");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            (store, None)
        }
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(store, config);
    let app = workspace_api::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Workspace API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pg) = pg {
        pg.close().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
