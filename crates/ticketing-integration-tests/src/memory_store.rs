//! In-memory stand-ins for `EventRepository`/`TicketRepository`, mirroring
//! the Postgres semantics closely enough to exercise the reservation engine,
//! reaper, and read path end to end without a live database, the same
//! "local variant is a drop-in for the production one" substitution the
//! Lock Manager already supports (§9).

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use ticketing_common::{Event, EventDraft, EventId, EventSortKey, Page, Ticket, TicketId, TicketStatus, TicketingError};
use ticketing_store::{EventRepository, TicketRepository};

struct EventRow {
    id: EventId,
    name: String,
    venue: String,
    event_date: DateTime<Utc>,
    total_tickets: i32,
}

/// A single `Mutex` over both tables, standing in for the atomicity a real
/// transaction gives the Postgres repositories: the smallest-id read and its
/// update happen while one lock is held, so two concurrent `reserve_one`
/// calls can never pick the same ticket.
pub struct MemoryStore {
    events: Mutex<Vec<EventRow>>,
    tickets: Mutex<Vec<Ticket>>,
    next_event_id: AtomicI64,
    next_ticket_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            tickets: Mutex::new(Vec::new()),
            next_event_id: AtomicI64::new(1),
            next_ticket_id: AtomicI64::new(1),
        }
    }

    fn available_count(tickets: &[Ticket], event_id: EventId) -> i64 {
        tickets
            .iter()
            .filter(|t| t.event_id == event_id && t.status == TicketStatus::Available)
            .count() as i64
    }

    fn to_event(row: &EventRow, available: i64) -> Event {
        Event {
            id: row.id,
            name: row.name.clone(),
            venue: row.venue.clone(),
            event_date: row.event_date,
            total_tickets: row.total_tickets,
            available_tickets: available,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EventRepository for MemoryStore {
    async fn create(&self, draft: &EventDraft) -> Result<Event, TicketingError> {
        let id = EventId(self.next_event_id.fetch_add(1, Ordering::SeqCst));

        {
            let mut events = self.events.lock().unwrap();
            events.push(EventRow {
                id,
                name: draft.name.clone(),
                venue: draft.venue.clone(),
                event_date: draft.event_date,
                total_tickets: draft.total_tickets,
            });
        }

        let mut tickets = self.tickets.lock().unwrap();
        for _ in 0..draft.total_tickets {
            let ticket_id = TicketId(self.next_ticket_id.fetch_add(1, Ordering::SeqCst));
            tickets.push(Ticket {
                id: ticket_id,
                event_id: id,
                status: TicketStatus::Available,
                customer_email: None,
                reserved_until: None,
                created_at: Utc::now(),
            });
        }

        Ok(Event {
            id,
            name: draft.name.clone(),
            venue: draft.venue.clone(),
            event_date: draft.event_date,
            total_tickets: draft.total_tickets,
            available_tickets: draft.total_tickets as i64,
        })
    }

    async fn get(&self, id: EventId) -> Result<Option<Event>, TicketingError> {
        let events = self.events.lock().unwrap();
        let Some(row) = events.iter().find(|e| e.id == id) else {
            return Ok(None);
        };
        let tickets = self.tickets.lock().unwrap();
        Ok(Some(Self::to_event(row, Self::available_count(&tickets, id))))
    }

    async fn list(&self) -> Result<Vec<Event>, TicketingError> {
        let events = self.events.lock().unwrap();
        let tickets = self.tickets.lock().unwrap();
        Ok(events
            .iter()
            .map(|e| Self::to_event(e, Self::available_count(&tickets, e.id)))
            .collect())
    }

    async fn list_paged(
        &self,
        page: u32,
        size: u32,
        sort: EventSortKey,
    ) -> Result<Page<Event>, TicketingError> {
        let events = self.events.lock().unwrap();
        let tickets = self.tickets.lock().unwrap();
        let mut all: Vec<Event> = events
            .iter()
            .map(|e| Self::to_event(e, Self::available_count(&tickets, e.id)))
            .collect();

        match sort {
            EventSortKey::Id => all.sort_by_key(|e| e.id),
            EventSortKey::EventDate => all.sort_by_key(|e| e.event_date),
            EventSortKey::Name => all.sort_by(|a, b| a.name.cmp(&b.name)),
        }

        let total = all.len() as i64;
        let start = ((page.saturating_sub(1)) as usize) * size as usize;
        let items = all.into_iter().skip(start).take(size as usize).collect();

        Ok(Page {
            items,
            page,
            size,
            total,
        })
    }

    async fn list_available(&self) -> Result<Vec<Event>, TicketingError> {
        let events = self.events.lock().unwrap();
        let tickets = self.tickets.lock().unwrap();
        Ok(events
            .iter()
            .map(|e| (e, Self::available_count(&tickets, e.id)))
            .filter(|(_, available)| *available > 0)
            .map(|(e, available)| Self::to_event(e, available))
            .collect())
    }
}

#[async_trait::async_trait]
impl TicketRepository for MemoryStore {
    async fn reserve_one(
        &self,
        event_id: EventId,
        customer_email: &str,
        window: Duration,
    ) -> Result<Ticket, TicketingError> {
        let mut tickets = self.tickets.lock().unwrap();

        let candidate = tickets
            .iter()
            .filter(|t| t.event_id == event_id && t.status == TicketStatus::Available)
            .min_by_key(|t| t.id)
            .map(|t| t.id);

        let Some(ticket_id) = candidate else {
            return Err(TicketingError::NoTicketsAvailable(event_id.value()));
        };

        let slot = tickets.iter_mut().find(|t| t.id == ticket_id).unwrap();
        slot.status = TicketStatus::Reserved;
        slot.customer_email = Some(customer_email.to_string());
        slot.reserved_until = Some(Utc::now() + window);

        Ok(slot.clone())
    }

    async fn count_available(&self, event_id: EventId) -> Result<i64, TicketingError> {
        let tickets = self.tickets.lock().unwrap();
        Ok(Self::available_count(&tickets, event_id))
    }

    async fn list_available(&self, event_id: EventId) -> Result<Vec<Ticket>, TicketingError> {
        let tickets = self.tickets.lock().unwrap();
        let mut result: Vec<Ticket> = tickets
            .iter()
            .filter(|t| t.event_id == event_id && t.status == TicketStatus::Available)
            .cloned()
            .collect();
        result.sort_by_key(|t| t.id);
        Ok(result)
    }

    async fn list_by_customer(&self, email: &str) -> Result<Vec<Ticket>, TicketingError> {
        let tickets = self.tickets.lock().unwrap();
        let mut result: Vec<Ticket> = tickets
            .iter()
            .filter(|t| t.customer_email.as_deref() == Some(email))
            .cloned()
            .collect();
        result.sort_by_key(|t| t.id);
        Ok(result)
    }

    async fn reap_expired(&self, now: DateTime<Utc>) -> Result<Vec<EventId>, TicketingError> {
        let mut tickets = self.tickets.lock().unwrap();
        let mut affected = Vec::new();

        for ticket in tickets.iter_mut() {
            if ticket.status == TicketStatus::Reserved {
                if let Some(deadline) = ticket.reserved_until {
                    if deadline <= now {
                        ticket.status = TicketStatus::Available;
                        ticket.customer_email = None;
                        ticket.reserved_until = None;
                        affected.push(ticket.event_id);
                    }
                }
            }
        }

        affected.sort_by_key(|e| e.value());
        affected.dedup();
        Ok(affected)
    }
}
