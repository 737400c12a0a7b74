//! Reservation engine: the write path that claims one ticket for a
//! customer (§4.2).

use std::sync::Arc;

use chrono::Duration;
use ticketing_cache::{keys, Cache, LockError, LockManager};
use ticketing_common::{EventId, LockConfig, ReservationConfig, Ticket, TicketingError};
use ticketing_store::{EventRepository, TicketRepository};
use tracing::{info, instrument, warn};

/// Claims one `AVAILABLE` ticket for an event on behalf of a customer.
///
/// The distributed lock is taken even though the seat selection runs inside
/// a database transaction: reading the smallest available id must be atomic
/// with its update against concurrent readers, and a cross-replica lock is a
/// cleaner abstraction for that than escalating to `SELECT ... FOR UPDATE`
/// with multi-event deadlock ordering.
pub struct ReservationEngine {
    events: Arc<dyn EventRepository>,
    tickets: Arc<dyn TicketRepository>,
    cache: Arc<dyn Cache>,
    locks: Arc<dyn LockManager>,
    reservation: ReservationConfig,
    lock: LockConfig,
}

impl ReservationEngine {
    pub fn new(
        events: Arc<dyn EventRepository>,
        tickets: Arc<dyn TicketRepository>,
        cache: Arc<dyn Cache>,
        locks: Arc<dyn LockManager>,
        reservation: ReservationConfig,
        lock: LockConfig,
    ) -> Self {
        Self {
            events,
            tickets,
            cache,
            locks,
            reservation,
            lock,
        }
    }

    #[instrument(skip(self), fields(event_id = event_id.value()))]
    pub async fn reserve(
        &self,
        event_id: EventId,
        customer_email: &str,
    ) -> Result<Ticket, TicketingError> {
        if !event_id.is_valid() {
            return Err(TicketingError::ValidationFailed(
                "eventId must be positive".to_string(),
            ));
        }
        ticketing_common::validate_customer_email(customer_email)?;

        if self.events.get(event_id).await?.is_none() {
            return Err(TicketingError::EventNotFound(event_id.value()));
        }

        let lock_key = keys::reservation_lock_key(event_id);
        let wait_budget = std::time::Duration::from_millis(self.lock.wait_budget_ms);
        let lease_budget = std::time::Duration::from_millis(self.lock.lease_budget_ms);

        let token = self
            .locks
            .acquire(&lock_key, wait_budget, lease_budget)
            .await
            .map_err(|err| match err {
                LockError::AcquireTimeout(key) => {
                    TicketingError::LockUnavailable(format!("could not lock {key}"))
                }
                LockError::Backend(msg) => TicketingError::Internal(msg),
            })?;

        let window = Duration::seconds(self.reservation.window_secs as i64);
        let outcome = self
            .tickets
            .reserve_one(event_id, customer_email, window)
            .await;

        self.invalidate_for(event_id).await;

        if let Err(err) = self.locks.release(&lock_key, token).await {
            warn!(event_id = event_id.value(), error = %err, "lock release failed, lease will self-expire");
        }

        let ticket = outcome?;
        info!(event_id = event_id.value(), ticket_id = ticket.id.value(), "reserved ticket");
        Ok(ticket)
    }

    /// Invalidate every cache region the spec's caching table names as
    /// affected by a reservation (§4.4): the event's own entry, the
    /// singleton listings, every paged listing, and the availability count.
    /// Invalidation failures are logged and swallowed: TTL expiry is the
    /// self-healing backstop.
    async fn invalidate_for(&self, event_id: EventId) {
        self.cache.invalidate(&keys::event_key(event_id)).await;
        self.cache.invalidate(keys::events_list_key()).await;
        self.cache.invalidate(keys::available_events_key()).await;
        self.cache
            .invalidate(&keys::available_tickets_count_key(event_id))
            .await;
        // Paged caches are addressed by page+size, an unbounded key space;
        // a single all-pages invalidation marker is swept by the read path
        // (see ReadPathService::list_events_paged).
        self.cache
            .set_raw(
                keys::paged_cache_epoch_key(),
                uuid::Uuid::new_v4().to_string(),
                std::time::Duration::from_secs(3600),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketing_cache::{InMemoryCache, LocalLockManager};
    use ticketing_common::{Event, EventDraft, Page};
    use tokio::sync::Mutex;

    struct FakeEvents {
        events: Mutex<Vec<Event>>,
    }

    #[async_trait::async_trait]
    impl EventRepository for FakeEvents {
        async fn create(&self, _draft: &EventDraft) -> Result<Event, TicketingError> {
            unimplemented!()
        }

        async fn get(&self, id: EventId) -> Result<Option<Event>, TicketingError> {
            Ok(self
                .events
                .lock()
                .await
                .iter()
                .find(|e| e.id == id)
                .cloned())
        }

        async fn list(&self) -> Result<Vec<Event>, TicketingError> {
            Ok(self.events.lock().await.clone())
        }

        async fn list_paged(
            &self,
            _page: u32,
            _size: u32,
            _sort: ticketing_common::EventSortKey,
        ) -> Result<Page<Event>, TicketingError> {
            unimplemented!()
        }

        async fn list_available(&self) -> Result<Vec<Event>, TicketingError> {
            unimplemented!()
        }
    }

    struct FakeTickets {
        available: Mutex<i64>,
    }

    #[async_trait::async_trait]
    impl TicketRepository for FakeTickets {
        async fn reserve_one(
            &self,
            event_id: EventId,
            customer_email: &str,
            window: Duration,
        ) -> Result<Ticket, TicketingError> {
            let mut available = self.available.lock().await;
            if *available <= 0 {
                return Err(TicketingError::NoTicketsAvailable(event_id.value()));
            }
            *available -= 1;
            Ok(Ticket {
                id: ticketing_common::TicketId(1),
                event_id,
                status: ticketing_common::TicketStatus::Reserved,
                customer_email: Some(customer_email.to_string()),
                reserved_until: Some(chrono::Utc::now() + window),
                created_at: chrono::Utc::now(),
            })
        }

        async fn count_available(&self, _event_id: EventId) -> Result<i64, TicketingError> {
            Ok(*self.available.lock().await)
        }

        async fn list_available(&self, _event_id: EventId) -> Result<Vec<Ticket>, TicketingError> {
            unimplemented!()
        }

        async fn list_by_customer(&self, _email: &str) -> Result<Vec<Ticket>, TicketingError> {
            unimplemented!()
        }

        async fn reap_expired(
            &self,
            _now: chrono::DateTime<chrono::Utc>,
        ) -> Result<Vec<EventId>, TicketingError> {
            unimplemented!()
        }
    }

    fn engine(available: i64) -> ReservationEngine {
        let events = Arc::new(FakeEvents {
            events: Mutex::new(vec![Event {
                id: EventId(1),
                name: "Show".to_string(),
                venue: "Hall".to_string(),
                event_date: chrono::Utc::now(),
                total_tickets: 10,
                available_tickets: available,
            }]),
        });
        let tickets = Arc::new(FakeTickets {
            available: Mutex::new(available),
        });
        ReservationEngine::new(
            events,
            tickets,
            Arc::new(InMemoryCache::default()),
            Arc::new(LocalLockManager::new()),
            ReservationConfig::default(),
            ticketing_common::LockConfig::default(),
        )
    }

    #[tokio::test]
    async fn reserve_succeeds_when_tickets_available() {
        let engine = engine(1);
        let ticket = engine.reserve(EventId(1), "person@example.com").await.unwrap();
        assert_eq!(ticket.event_id, EventId(1));
    }

    #[tokio::test]
    async fn reserve_fails_when_sold_out() {
        let engine = engine(0);
        let err = engine.reserve(EventId(1), "person@example.com").await.unwrap_err();
        assert!(matches!(err, TicketingError::NoTicketsAvailable(1)));
    }

    #[tokio::test]
    async fn reserve_fails_for_unknown_event() {
        let engine = engine(1);
        let err = engine.reserve(EventId(999), "person@example.com").await.unwrap_err();
        assert!(matches!(err, TicketingError::EventNotFound(999)));
    }

    #[tokio::test]
    async fn reserve_rejects_malformed_email() {
        let engine = engine(1);
        let err = engine.reserve(EventId(1), "not-an-email").await.unwrap_err();
        assert!(matches!(err, TicketingError::ValidationFailed(_)));
    }
}
