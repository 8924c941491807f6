//! Main entry point for the banking backend.
//!
//! This file initializes logging, loads configuration, selects the account
//! store (PostgreSQL when `DATABASE_URL` is set, in-memory otherwise) and
//! serves the Axum application.

use std::sync::Arc;

use anyhow::Context;
use bank_adapters::{AccountStore, InMemoryStore};
use bank_backend::config::AppConfig;
use bank_backend::database::{self, PgAccountStore};
use bank_backend::AppState;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store: Arc<dyn AccountStore> = match &config.database {
        Some(db_config) => {
            let pool = database::create_pool(db_config)
                .await
                .context("failed to connect to database")?;
            database::run_migrations(&pool)
                .await
                .context("failed to initialize database schema")?;
            info!("Database initialized");
            Arc::new(PgAccountStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, accounts are kept in memory and lost on exit");
            Arc::new(InMemoryStore::new())
        }
    };

    let state = AppState::new(store, &config);
    let app = bank_backend::app(state, config.request_timeout);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(address = %config.bind_addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bank_backend=debug"));

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
