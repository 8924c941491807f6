//! Module for database connection setup and common utilities.
//!
//! This module is responsible for initializing the PostgreSQL connection pool,
//! creating the accounts schema and exposing the sqlx-backed `AccountStore`.

pub mod models;
pub mod queries;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::{duration_or, parse_or, ConfigError};

pub use queries::PgAccountStore;

/// Database configuration.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Database connection URL (from DATABASE_URL env var)
    pub database_url: String,

    /// Maximum number of connections in the pool
    /// Default: 10
    pub max_connections: u32,

    /// Maximum time to wait for a connection from the pool
    /// Default: 30 seconds
    pub acquire_timeout: Duration,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URL may carry a password.
        f.debug_struct("DatabaseConfig")
            .field("database_url", &"..")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl DatabaseConfig {
    /// Build from a connection URL plus `DB_MAX_CONNECTIONS` and `DB_ACQUIRE_TIMEOUT`.
    pub fn from_lookup<F>(database_url: String, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_connections = parse_or(lookup, "DB_MAX_CONNECTIONS", Some(10), |s| {
            s.parse::<u32>().ok().filter(|n| *n > 0)
        })?;
        let acquire_timeout = duration_or(lookup, "DB_ACQUIRE_TIMEOUT", Duration::from_secs(30))?;

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout,
        })
    }
}

/// Create a connection pool and verify connectivity.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await?;

    info!(
        max_connections = config.max_connections,
        "Database pool created"
    );

    Ok(pool)
}

/// Create the accounts table if it does not exist yet.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id            BIGSERIAL PRIMARY KEY,
            first_name    VARCHAR(255) NOT NULL,
            last_name     VARCHAR(255) NOT NULL,
            password_hash VARCHAR(255) NOT NULL,
            number        BIGINT NOT NULL UNIQUE,
            balance       NUMERIC NOT NULL DEFAULT 0,
            created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
