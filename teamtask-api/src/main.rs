//! # TeamTask API Server
//!
//! Loads configuration, opens the configured store and serves the JSON API
//! until Ctrl-C.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/teamtask JWT_SECRET=... cargo run -p teamtask-api
//! STORAGE_BACKEND=memory JWT_SECRET=... cargo run -p teamtask-api
//! ```

use std::sync::Arc;

use teamtask_api::{
    app::{build_router, AppState},
    config::{Config, StorageBackend},
};
use teamtask_shared::{
    db::{migrations::run_migrations, pool::create_pool, pool::DatabaseConfig},
    store::{memory::MemoryStore, postgres::PgStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "teamtask_api=debug,teamtask_shared=info,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on shutdown");
            let store: Arc<dyn Store> = MemoryStore::new_shared();
            Ok(store)
        }
        StorageBackend::Postgres => {
            let pool = create_pool(DatabaseConfig {
                url: config.database.url.clone(),
                max_connections: config.database.max_connections,
                lazy: config.database.lazy,
                ..DatabaseConfig::default()
            })
            .await?;

            if config.database.lazy {
                tracing::info!("Lazy pool: skipping migrations until the database is reachable");
            } else {
                run_migrations(&pool).await?;
            }

            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
            Ok(store)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "TeamTask API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let store = open_store(&config).await?;
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
