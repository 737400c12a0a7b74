//! Shared test fixtures.

use chrono::{Duration, Utc};
use ticketing_common::EventDraft;

/// A valid draft, 30 days out, with `total` seats.
pub fn sample_draft(total: i32) -> EventDraft {
    EventDraft {
        name: "Spring Concert".to_string(),
        venue: "Madison Square Garden".to_string(),
        event_date: Utc::now() + Duration::days(30),
        total_tickets: total,
    }
}

/// Test database URL, overridable via `TEST_DATABASE_URL` (§8: integration
/// tests gated on a real Postgres).
#[cfg(feature = "database")]
pub fn test_database_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/ticketing_test".to_string())
}

#[cfg(feature = "database")]
pub struct TestDatabase {
    pub pool: sqlx::PgPool,
}

#[cfg(feature = "database")]
impl TestDatabase {
    pub async fn new() -> Result<Self, sqlx::Error> {
        let pool = sqlx::PgPool::connect(&test_database_url()).await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn cleanup(&self) -> Result<(), sqlx::Error> {
        sqlx::query("TRUNCATE TABLE tickets, events RESTART IDENTITY CASCADE")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
