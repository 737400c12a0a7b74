//! Event persistence: creation (with ticket seeding) and read queries.

use sqlx::{PgPool, Row};
use ticketing_common::{Event, EventDraft, EventId, EventSortKey, Page, TicketingError};

/// Persistence contract for events. Only `create` mutates event rows (§5).
#[async_trait::async_trait]
pub trait EventRepository: Send + Sync {
    /// Persist a new event and seed `total_tickets` tickets, all
    /// `AVAILABLE`, in one transaction (I1: ticket count matches
    /// `total_tickets` the moment the event becomes visible).
    async fn create(&self, draft: &EventDraft) -> Result<Event, TicketingError>;

    /// Fetch a single event with its derived availability count.
    async fn get(&self, id: EventId) -> Result<Option<Event>, TicketingError>;

    /// All events, each with `available_tickets` populated.
    async fn list(&self) -> Result<Vec<Event>, TicketingError>;

    /// A page of events, sorted by the given key.
    async fn list_paged(
        &self,
        page: u32,
        size: u32,
        sort: EventSortKey,
    ) -> Result<Page<Event>, TicketingError>;

    /// Events with at least one `AVAILABLE` ticket.
    async fn list_available(&self) -> Result<Vec<Event>, TicketingError>;
}

/// PostgreSQL-backed event repository.
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_event(row: &sqlx::postgres::PgRow, available_tickets: i64) -> Event {
        Event {
            id: EventId(row.get("id")),
            name: row.get("name"),
            venue: row.get("venue"),
            event_date: row.get("event_date"),
            total_tickets: row.get("total_tickets"),
            available_tickets,
        }
    }
}

#[async_trait::async_trait]
impl EventRepository for PgEventRepository {
    async fn create(&self, draft: &EventDraft) -> Result<Event, TicketingError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO events (name, venue, event_date, total_tickets)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.venue)
        .bind(draft.event_date)
        .bind(draft.total_tickets)
        .fetch_one(&mut *tx)
        .await?;

        let event_id: i64 = row.get("id");

        // Seed tickets in a single batched INSERT ... SELECT rather than
        // `total_tickets` round-trips.
        sqlx::query(
            r#"
            INSERT INTO tickets (event_id, status)
            SELECT $1, 'AVAILABLE' FROM generate_series(1, $2)
            "#,
        )
        .bind(event_id)
        .bind(draft.total_tickets)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Event {
            id: EventId(event_id),
            name: draft.name.clone(),
            venue: draft.venue.clone(),
            event_date: draft.event_date,
            total_tickets: draft.total_tickets,
            available_tickets: draft.total_tickets as i64,
        })
    }

    async fn get(&self, id: EventId) -> Result<Option<Event>, TicketingError> {
        let row = sqlx::query(
            r#"SELECT id, name, venue, event_date, total_tickets FROM events WHERE id = $1"#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let available: i64 = sqlx::query_scalar(
            r#"SELECT count(*) FROM tickets WHERE event_id = $1 AND status = 'AVAILABLE'"#,
        )
        .bind(id.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(Some(Self::row_to_event(&row, available)))
    }

    async fn list(&self) -> Result<Vec<Event>, TicketingError> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.name, e.venue, e.event_date, e.total_tickets,
                   count(t.id) FILTER (WHERE t.status = 'AVAILABLE') AS available
            FROM events e
            LEFT JOIN tickets t ON t.event_id = e.id
            GROUP BY e.id
            ORDER BY e.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| Self::row_to_event(r, r.get::<i64, _>("available")))
            .collect())
    }

    async fn list_paged(
        &self,
        page: u32,
        size: u32,
        sort: EventSortKey,
    ) -> Result<Page<Event>, TicketingError> {
        let offset = (page.saturating_sub(1)) as i64 * size as i64;

        let total: i64 = sqlx::query_scalar("SELECT count(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT e.id, e.name, e.venue, e.event_date, e.total_tickets,
                   count(t.id) FILTER (WHERE t.status = 'AVAILABLE') AS available
            FROM events e
            LEFT JOIN tickets t ON t.event_id = e.id
            GROUP BY e.id
            ORDER BY e.{} ASC
            LIMIT $1 OFFSET $2
            "#,
            sort.column()
        );

        let rows = sqlx::query(&sql)
            .bind(size as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .iter()
            .map(|r| Self::row_to_event(r, r.get::<i64, _>("available")))
            .collect();

        Ok(Page {
            items,
            page,
            size,
            total,
        })
    }

    async fn list_available(&self) -> Result<Vec<Event>, TicketingError> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.name, e.venue, e.event_date, e.total_tickets,
                   count(t.id) AS available
            FROM events e
            JOIN tickets t ON t.event_id = e.id AND t.status = 'AVAILABLE'
            GROUP BY e.id
            ORDER BY e.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| Self::row_to_event(r, r.get::<i64, _>("available")))
            .collect())
    }
}
