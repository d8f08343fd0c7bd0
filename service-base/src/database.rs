//! Database connection pool management

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use crate::{
    config::DatabaseConfig,
    error::{sanitize_url, DatabaseError, DatabaseOperation, Result},
};

/// Create a SQLite connection pool with retry logic
///
/// The database file is created if it does not exist and foreign key
/// enforcement is switched on for every connection.
pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = retry_with_backoff(config.max_retries, config.retry_delay(), || {
        try_create_pool(config)
    })
    .await?;

    tracing::info!(
        url = %sanitize_url(&config.url),
        "Database connection pool created: max={}, min={}",
        config.max_connections,
        config.min_connections
    );
    Ok(pool)
}

/// Run `attempt` until it succeeds, fails for good, or `max_retries` retries are spent
///
/// The n-th retry waits `base_delay * 2^(n-1)`.
async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut attempt_fn: F,
) -> std::result::Result<T, DatabaseError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, DatabaseError>>,
{
    let mut attempt = 0;

    loop {
        match attempt_fn().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(
                        "Database connection established after {} attempt(s)",
                        attempt + 1
                    );
                }
                return Ok(value);
            }
            Err(e) => {
                attempt += 1;

                if attempt > max_retries || !e.is_retriable() {
                    tracing::error!(
                        "Failed to connect to database after {} attempt(s): {}",
                        attempt,
                        e
                    );
                    return Err(e);
                }

                let delay = base_delay * 2_u32.saturating_pow(attempt - 1);

                tracing::warn!(
                    "Database connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Attempt to create a database pool (single try)
async fn try_create_pool(
    config: &DatabaseConfig,
) -> std::result::Result<SqlitePool, DatabaseError> {
    let url_safe = sanitize_url(&config.url);

    if !config.url.starts_with("sqlite:") {
        return Err(DatabaseError::configuration(format!(
            "Unsupported database URL '{}': expected sqlite://<path> or sqlite::memory:",
            url_safe
        )));
    }

    let options = SqliteConnectOptions::from_str(&config.url)
        .map_err(|e| {
            DatabaseError::configuration(format!("Invalid database URL '{}': {}", url_safe, e))
        })?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connection_timeout())
        .connect_with(options)
        .await
        .map_err(|e| {
            DatabaseError::from(e)
                .with_operation(DatabaseOperation::Connect)
                .with_context(format!("opening '{}'", url_safe))
        })
}
