//! Read-path service: every query operation, fronted by a read-through
//! cache with coarse write-path invalidation (§4.4).

use std::sync::Arc;

use ticketing_cache::{keys, Cache, CacheExt};
use ticketing_common::{CacheConfig, Event, EventDraft, EventId, EventSortKey, Page, Ticket, TicketingError};
use ticketing_store::{EventRepository, TicketRepository};
use tracing::instrument;

pub struct ReadPathService {
    events: Arc<dyn EventRepository>,
    tickets: Arc<dyn TicketRepository>,
    cache: Arc<dyn Cache>,
    config: CacheConfig,
}

impl ReadPathService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        tickets: Arc<dyn TicketRepository>,
        cache: Arc<dyn Cache>,
        config: CacheConfig,
    ) -> Self {
        Self {
            events,
            tickets,
            cache,
            config,
        }
    }

    fn ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.config.ttl_secs)
    }

    #[instrument(skip(self))]
    pub async fn list_events(&self) -> Result<Vec<Event>, TicketingError> {
        let key = keys::events_list_key();
        if let Some(cached) = self.cache.get_json::<Vec<Event>>(key).await {
            return Ok(cached);
        }

        let events = self.events.list().await?;
        if !events.is_empty() {
            self.cache.set_json(key, &events, self.ttl()).await;
        }
        Ok(events)
    }

    #[instrument(skip(self))]
    pub async fn list_events_paged(
        &self,
        page: u32,
        size: u32,
        sort: EventSortKey,
    ) -> Result<Page<Event>, TicketingError> {
        let epoch = self
            .cache
            .get_raw(keys::paged_cache_epoch_key())
            .await
            .unwrap_or_else(|| "0".to_string());
        let key = keys::events_paged_key(page, size, &epoch);

        if let Some(cached) = self.cache.get_json::<Page<Event>>(&key).await {
            return Ok(cached);
        }

        let result = self.events.list_paged(page, size, sort).await?;
        if !result.items.is_empty() {
            self.cache.set_json(&key, &result, self.ttl()).await;
        }
        Ok(result)
    }

    #[instrument(skip(self), fields(event_id = id.value()))]
    pub async fn get_event(&self, id: EventId) -> Result<Event, TicketingError> {
        let key = keys::event_key(id);
        if let Some(cached) = self.cache.get_json::<Event>(&key).await {
            return Ok(cached);
        }

        let event = self
            .events
            .get(id)
            .await?
            .ok_or(TicketingError::EventNotFound(id.value()))?;
        self.cache.set_json(&key, &event, self.ttl()).await;
        Ok(event)
    }

    #[instrument(skip(self))]
    pub async fn list_available_events(&self) -> Result<Vec<Event>, TicketingError> {
        let key = keys::available_events_key();
        if let Some(cached) = self.cache.get_json::<Vec<Event>>(key).await {
            return Ok(cached);
        }

        let events = self.events.list_available().await?;
        if !events.is_empty() {
            self.cache.set_json(key, &events, self.ttl()).await;
        }
        Ok(events)
    }

    #[instrument(skip(self), fields(event_id = event_id.value()))]
    pub async fn list_available_tickets(&self, event_id: EventId) -> Result<Vec<Ticket>, TicketingError> {
        self.tickets.list_available(event_id).await
    }

    #[instrument(skip(self, email))]
    pub async fn list_by_customer(&self, email: &str) -> Result<Vec<Ticket>, TicketingError> {
        ticketing_common::validate_customer_email(email)?;
        self.tickets.list_by_customer(email).await
    }

    #[instrument(skip(self, draft))]
    pub async fn create_event(&self, draft: EventDraft) -> Result<Event, TicketingError> {
        draft.validate(chrono::Utc::now())?;
        let event = self.events.create(&draft).await?;
        self.invalidate_listings().await;
        Ok(event)
    }

    #[instrument(skip(self), fields(event_id = event_id.value()))]
    pub async fn get_available_count(&self, event_id: EventId) -> Result<i64, TicketingError> {
        let key = keys::available_tickets_count_key(event_id);
        if let Some(cached) = self.cache.get_json::<i64>(&key).await {
            return Ok(cached);
        }

        let count = self.tickets.count_available(event_id).await?;
        self.cache.set_json(&key, &count, self.ttl()).await;
        Ok(count)
    }

    /// Invalidate the listing caches affected by `createEvent` (§4.4): the
    /// full listing, the paged listing (via epoch bump), and the
    /// available-events listing. A newly created event has no entry in
    /// `events`/`available-tickets-count` yet, so those are untouched.
    async fn invalidate_listings(&self) {
        self.cache.invalidate(keys::events_list_key()).await;
        self.cache.invalidate(keys::available_events_key()).await;
        self.cache
            .set_raw(
                keys::paged_cache_epoch_key(),
                uuid::Uuid::new_v4().to_string(),
                std::time::Duration::from_secs(3600),
            )
            .await;
    }
}
