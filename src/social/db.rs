//! SQLite database helpers: pool creation plus sqlx migrations.
//!
//! Migrations live in the crate-root `migrations/` directory and are applied
//! through `sqlx::migrate!()` whenever a pool is opened.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use tracing::info;

/// Create a SQLite pool and run every pending migration
pub async fn create_sqlite_pool_with_migration(
    db_url: &str,
    max_connections: u32,
) -> Result<Pool<Sqlite>> {
    info!("[DB] opening SQLite pool: {}", db_url);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await
        .with_context(|| format!("failed to connect to SQLite database: {}", db_url))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    Ok(pool)
}

/// Create a migrated in-memory pool.
///
/// Every connection to `sqlite::memory:` sees its own database, so the pool is
/// pinned to one connection that never expires.
pub async fn create_memory_pool() -> Result<Pool<Sqlite>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .context("failed to open in-memory SQLite database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    Ok(pool)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Once;

    static INIT_LOGGER: Once = Once::new();

    /// Route crate logs to the test harness writer, once per test binary
    pub(crate) fn init_test_logger() {
        INIT_LOGGER.call_once(|| {
            use tracing_subscriber::prelude::*;
            use tracing_subscriber::EnvFilter;

            let filter_layer = EnvFilter::new("info,cocktail_sdk_core_rust=debug,sqlx=warn");
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_test_writer();

            let _ = tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt_layer)
                .try_init();
        });
    }
}
