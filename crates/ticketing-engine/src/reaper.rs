//! Expiry reaper: the background worker that reclaims `RESERVED` tickets
//! whose hold has lapsed (§4.3).
//!
//! The reaper never takes the per-event reservation lock: it only moves
//! tickets `RESERVED -> AVAILABLE`, the reverse of what the lock guards, and
//! its batch update is idempotent, so two overlapping ticks (or a tick
//! racing a reservation) can never double-reap or corrupt state.

use std::sync::Arc;

use ticketing_cache::{keys, Cache};
use ticketing_common::{EventId, ReaperConfig};
use ticketing_store::TicketRepository;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

pub struct ExpiryReaper {
    tickets: Arc<dyn TicketRepository>,
    cache: Arc<dyn Cache>,
    config: ReaperConfig,
}

impl ExpiryReaper {
    pub fn new(tickets: Arc<dyn TicketRepository>, cache: Arc<dyn Cache>, config: ReaperConfig) -> Self {
        Self {
            tickets,
            cache,
            config,
        }
    }

    /// Spawn the periodic reaper task. The first tick fires after
    /// `initial_delay_secs`; subsequent ticks fire every `period_secs`.
    /// Cancelling `shutdown` lets the task drain and return cleanly.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let initial_delay = std::time::Duration::from_secs(self.config.initial_delay_secs);
            let period = std::time::Duration::from_secs(self.config.period_secs);

            let mut interval = tokio::time::interval_at(
                tokio::time::Instant::now() + initial_delay,
                period,
            );
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                    () = shutdown.cancelled() => {
                        info!("expiry reaper shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Run a single reap pass: batch-reclaim every `RESERVED` ticket whose
    /// `reserved_until` has passed, then invalidate the affected events'
    /// availability caches. Logged and swallowed on failure; the next tick
    /// tries again.
    #[instrument(skip(self))]
    pub async fn tick(&self) {
        match self.tickets.reap_expired(chrono::Utc::now()).await {
            Ok(event_ids) => {
                if event_ids.is_empty() {
                    return;
                }
                info!(reaped_events = event_ids.len(), "reaped expired reservations");
                self.invalidate(&event_ids).await;
            }
            Err(err) => {
                warn!(error = %err, "reaper tick failed, retrying next tick");
            }
        }
    }

    async fn invalidate(&self, event_ids: &[EventId]) {
        for &event_id in event_ids {
            self.cache.invalidate(&keys::event_key(event_id)).await;
            self.cache
                .invalidate(&keys::available_tickets_count_key(event_id))
                .await;
        }
        // Coarse invalidation of the listing caches is acceptable per §4.4:
        // the reaper can affect any event's aggregate availability.
        self.cache.invalidate(keys::events_list_key()).await;
        self.cache.invalidate(keys::available_events_key()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketing_cache::InMemoryCache;
    use ticketing_common::{Ticket, TicketId, TicketStatus, TicketingError};
    use tokio::sync::Mutex;

    struct FakeTickets {
        expired_events: Mutex<Vec<EventId>>,
        calls: Mutex<u32>,
    }

    #[async_trait::async_trait]
    impl TicketRepository for FakeTickets {
        async fn reserve_one(
            &self,
            _event_id: EventId,
            _customer_email: &str,
            _window: chrono::Duration,
        ) -> Result<Ticket, TicketingError> {
            unimplemented!()
        }

        async fn count_available(&self, _event_id: EventId) -> Result<i64, TicketingError> {
            unimplemented!()
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
            *self.calls.lock().await += 1;
            Ok(std::mem::take(&mut *self.expired_events.lock().await))
        }
    }

    #[allow(dead_code)]
    fn sample_ticket() -> Ticket {
        Ticket {
            id: TicketId(1),
            event_id: EventId(1),
            status: TicketStatus::Available,
            customer_email: None,
            reserved_until: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn tick_invalidates_caches_for_reaped_events() {
        let tickets = Arc::new(FakeTickets {
            expired_events: Mutex::new(vec![EventId(1), EventId(2)]),
            calls: Mutex::new(0),
        });
        let cache = Arc::new(InMemoryCache::default());
        cache
            .set_raw(keys::event_key(EventId(1)).as_str(), "stale".to_string(), std::time::Duration::from_secs(60))
            .await;

        let reaper = ExpiryReaper::new(tickets.clone(), cache.clone(), ReaperConfig::default());
        reaper.tick().await;

        assert_eq!(*tickets.calls.lock().await, 1);
        assert!(cache.get_raw(&keys::event_key(EventId(1))).await.is_none());
    }

    #[tokio::test]
    async fn tick_is_noop_when_nothing_expired() {
        let tickets = Arc::new(FakeTickets {
            expired_events: Mutex::new(vec![]),
            calls: Mutex::new(0),
        });
        let cache = Arc::new(InMemoryCache::default());
        let reaper = ExpiryReaper::new(tickets.clone(), cache, ReaperConfig::default());
        reaper.tick().await;
        assert_eq!(*tickets.calls.lock().await, 1);
    }
}
