//! Connection pool construction.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use ticketing_common::config::DatabaseConfig;

/// Build a bounded Postgres connection pool from configuration.
///
/// Pool exhaustion surfaces as a timed-out acquire rather than an unbounded
/// hang, since `acquire_timeout` is derived from `connect_timeout_secs`.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await
}
