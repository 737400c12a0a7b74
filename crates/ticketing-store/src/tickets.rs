//! Ticket persistence: the reservation transaction, expiry reaping, and
//! read queries.

use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use ticketing_common::{EventId, Ticket, TicketId, TicketStatus, TicketingError};

/// Persistence contract for tickets. Only the reservation transaction and
/// the reaper batch update mutate ticket rows (§5); both transition a
/// ticket in exactly one direction each, which is why they can run without
/// mutual exclusion between them (§4.3).
#[async_trait::async_trait]
pub trait TicketRepository: Send + Sync {
    /// Select the smallest-id `AVAILABLE` ticket for `event_id` and
    /// transition it to `RESERVED` in one transaction (§4.2 step 3).
    ///
    /// Returns `NoTicketsAvailable` if the event currently has no
    /// `AVAILABLE` ticket. Callers must already hold the per-event
    /// reservation lock; this method performs no cross-replica exclusion of
    /// its own.
    async fn reserve_one(
        &self,
        event_id: EventId,
        customer_email: &str,
        window: Duration,
    ) -> Result<Ticket, TicketingError>;

    /// Count of `AVAILABLE` tickets for an event.
    async fn count_available(&self, event_id: EventId) -> Result<i64, TicketingError>;

    /// All currently-available tickets for an event.
    async fn list_available(&self, event_id: EventId) -> Result<Vec<Ticket>, TicketingError>;

    /// All tickets belonging to a customer, regardless of status (§9 open
    /// question (b): the source does not filter by status).
    async fn list_by_customer(&self, email: &str) -> Result<Vec<Ticket>, TicketingError>;

    /// Reclaim every `RESERVED` ticket whose `reserved_until` has passed, in
    /// a single batch update. Returns the distinct event ids affected, so
    /// the caller can invalidate exactly those cache entries.
    async fn reap_expired(&self, now: DateTime<Utc>) -> Result<Vec<EventId>, TicketingError>;
}

/// PostgreSQL-backed ticket repository.
pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_ticket(row: &sqlx::postgres::PgRow) -> Ticket {
        Ticket {
            id: TicketId(row.get("id")),
            event_id: EventId(row.get("event_id")),
            status: TicketStatus::parse_db_str(row.get::<&str, _>("status")),
            customer_email: row.get("customer_email"),
            reserved_until: row.get("reserved_until"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait::async_trait]
impl TicketRepository for PgTicketRepository {
    async fn reserve_one(
        &self,
        event_id: EventId,
        customer_email: &str,
        window: Duration,
    ) -> Result<Ticket, TicketingError> {
        let mut tx = self.pool.begin().await?;

        let candidate = sqlx::query(
            r#"
            SELECT id FROM tickets
            WHERE event_id = $1 AND status = 'AVAILABLE'
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(event_id.value())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(candidate) = candidate else {
            tx.rollback().await.ok();
            return Err(TicketingError::NoTicketsAvailable(event_id.value()));
        };

        let ticket_id: i64 = candidate.get("id");
        let reserved_until = Utc::now() + window;

        let row = sqlx::query(
            r#"
            UPDATE tickets
            SET status = 'RESERVED', customer_email = $2, reserved_until = $3
            WHERE id = $1 AND status = 'AVAILABLE'
            RETURNING id, event_id, status, customer_email, reserved_until, created_at
            "#,
        )
        .bind(ticket_id)
        .bind(customer_email)
        .bind(reserved_until)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            // Lost the race despite holding the reservation lock: a bug
            // elsewhere let a second writer through. Surface it rather than
            // silently retrying.
            tx.rollback().await.ok();
            return Err(TicketingError::Internal(format!(
                "ticket {ticket_id} was no longer AVAILABLE at update time"
            )));
        };

        tx.commit().await?;

        Ok(Self::row_to_ticket(&row))
    }

    async fn count_available(&self, event_id: EventId) -> Result<i64, TicketingError> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT count(*) FROM tickets WHERE event_id = $1 AND status = 'AVAILABLE'"#,
        )
        .bind(event_id.value())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_available(&self, event_id: EventId) -> Result<Vec<Ticket>, TicketingError> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_id, status, customer_email, reserved_until, created_at
            FROM tickets
            WHERE event_id = $1 AND status = 'AVAILABLE'
            ORDER BY id ASC
            "#,
        )
        .bind(event_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_ticket).collect())
    }

    async fn list_by_customer(&self, email: &str) -> Result<Vec<Ticket>, TicketingError> {
        let rows = sqlx::query(
            r#"
            SELECT id, event_id, status, customer_email, reserved_until, created_at
            FROM tickets
            WHERE customer_email = $1
            ORDER BY id ASC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_ticket).collect())
    }

    async fn reap_expired(&self, now: DateTime<Utc>) -> Result<Vec<EventId>, TicketingError> {
        let rows = sqlx::query(
            r#"
            UPDATE tickets
            SET status = 'AVAILABLE', customer_email = NULL, reserved_until = NULL
            WHERE status = 'RESERVED' AND reserved_until <= $1
            RETURNING event_id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        let mut ids: Vec<i64> = rows.iter().map(|r| r.get::<i64, _>("event_id")).collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids.into_iter().map(EventId).collect())
    }
}
