//! Pokedex record service.
//!
//! Serves the creature API over HTTP, backed by Postgres or, for local runs,
//! an in-memory store.

use std::sync::Arc;

use anyhow::Result;
use pokedex_service::{
    api,
    config::{self, StoreKind},
    creatures::CreatureStore,
    db::{Database, MemoryCreatureStore},
    state::AppState,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // Prefer RUST_LOG, fall back to POKEDEX_LOG_LEVEL
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting pokedex service");
    info!(
        listen_addr = %config.listen_addr,
        store = ?config.store,
        locale = ?config.locale,
        "Configuration loaded"
    );

    let store: Arc<dyn CreatureStore> = match config.store {
        StoreKind::Memory => {
            warn!("Using in-memory store; records are lost on shutdown");
            Arc::new(MemoryCreatureStore::new())
        }
        StoreKind::Postgres => {
            let db = match Database::connect(&config.database).await {
                Ok(db) => {
                    info!("Database connection established");
                    db
                }
                Err(e) => {
                    error!(error = %e, "Failed to connect to database");
                    return Err(e.into());
                }
            };

            if config.dev_mode {
                info!("Running database migrations (dev mode)");
                if let Err(e) = db.run_migrations().await {
                    error!(error = %e, "Failed to run migrations");
                    return Err(e.into());
                }
            }

            Arc::new(db.creature_store())
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let state = AppState::new(store, config.locale);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let mut server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
            let shutdown_timeout = std::time::Duration::from_secs(10);
            if let Err(e) = tokio::time::timeout(shutdown_timeout, &mut server_handle).await {
                warn!(error = %e, "HTTP server did not shut down in time");
            }
        }
        result = &mut server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
        }
    }

    info!("Pokedex service shutdown complete");
    Ok(())
}
