//! Cache and lock key construction.
//!
//! Centralised here so every caller builds keys the same way; a typo in an
//! inline `format!` at a call site would silently break invalidation.

use ticketing_common::EventId;

/// The reservation lock key for an event: one independent critical section
/// per event (§4.1).
pub fn reservation_lock_key(event_id: EventId) -> String {
    format!("ticket:reserve:event:{event_id}")
}

/// Cache key for a single event's read model.
pub fn event_key(event_id: EventId) -> String {
    format!("events:{event_id}")
}

/// Cache key for the full event listing.
pub fn events_list_key() -> &'static str {
    "events-list"
}

/// Cache key for a page of events. Folds in the current paged-cache epoch
/// (see [`paged_cache_epoch_key`]) so a single epoch bump invalidates every
/// page+size combination at once, without enumerating the unbounded
/// page/size key space on each write.
pub fn events_paged_key(page: u32, size: u32, epoch: &str) -> String {
    format!("events-paged:{epoch}:{page}:{size}")
}

/// Key holding the current paged-cache epoch marker. Bumping the value
/// stored here invalidates every `events-paged` entry in one write.
pub fn paged_cache_epoch_key() -> &'static str {
    "events-paged-epoch"
}

/// Cache key for the "events with availability" listing.
pub fn available_events_key() -> &'static str {
    "available-events"
}

/// Cache key for an event's available-ticket count.
pub fn available_tickets_count_key(event_id: EventId) -> String {
    format!("available-tickets-count:{event_id}")
}
