use std::str::FromStr;
use std::time::Duration;

use myshop_core::config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

pub type DbPool = sqlx::SqlitePool;

pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(database_url, 5, 30).await
}

pub async fn connect_with_config(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&config.url, config.max_connections, config.timeout_secs).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let mut pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)));

    // Every connection to a private in-memory database sees its own empty
    // schema, and the data dies with the last connection.
    if is_private_memory(database_url) {
        debug!(
            event_name = "db.pool.single_connection",
            requested_max_connections = max_connections,
            "private in-memory sqlite database pinned to one connection"
        );
        pool = pool.max_connections(1).min_connections(1).idle_timeout(None).max_lifetime(None);
    }

    pool.connect_with(options).await
}

fn is_private_memory(database_url: &str) -> bool {
    let url = database_url.trim();
    let memory = url == ":memory:"
        || url == "sqlite::memory:"
        || url.starts_with("sqlite::memory:?")
        || url.contains("mode=memory");
    memory && !url.contains("cache=shared")
}
