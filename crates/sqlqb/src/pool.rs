//! Connection pool utilities

use crate::config::PoolConfig;
use crate::error::QbResult;

/// Create a SQLite pool from a database URL.
///
/// `sqlite::memory:` databases live per connection, so in-memory pools
/// should use `PoolConfig::new().max_connections(1)`.
///
/// # Example
///
/// ```ignore
/// let pool = sqlqb::create_sqlite_pool("sqlite://app.db", &PoolConfig::default()).await?;
/// let users = sqlqb::qb::table("users").read().fetch_all(&pool).await?;
/// ```
#[cfg(feature = "sqlite")]
pub async fn create_sqlite_pool(database_url: &str, config: &PoolConfig) -> QbResult<sqlx::SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create a MySQL pool from a database URL.
#[cfg(feature = "mysql")]
pub async fn create_mysql_pool(database_url: &str, config: &PoolConfig) -> QbResult<sqlx::MySqlPool> {
    let pool = sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await?;
    Ok(pool)
}
