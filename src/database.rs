//! PostgreSQL connection pool.
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Postgres;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "storefront";
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Open the pool. Acquiring a connection waits at most `timeout`.
pub async fn connect(
    config: &Postgres,
    timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    let username = config.username.as_deref().unwrap_or(DEFAULT_CREDENTIALS);
    let password = config.password.as_deref().unwrap_or(DEFAULT_CREDENTIALS);
    let database = config.database.as_deref().unwrap_or(DEFAULT_DATABASE_NAME);
    let hostname = &config.address;

    let addr = format!("postgres://{username}:{password}@{hostname}/{database}");
    let pool = PgPoolOptions::new()
        .max_connections(config.pool_size.unwrap_or(DEFAULT_POOL_SIZE))
        .acquire_timeout(timeout)
        .connect(&addr)
        .await?;

    tracing::info!(%hostname, %database, "postgres connected");

    Ok(pool)
}
