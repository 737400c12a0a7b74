//! Identity types for events and tickets.
//!
//! Both are monotonic integers assigned by the durable store, not client-
//! generated UUIDs: the smallest-available-ticket-id tie-break in the
//! reservation engine depends on a total order that increases with
//! insertion, which `BIGSERIAL` gives for free.

use serde::{Deserialize, Serialize};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl EventId {
    /// Get the underlying integer.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whether this id could plausibly reference a stored event (positive).
    pub fn is_valid(&self) -> bool {
        self.0 > 0
    }
}

impl From<i64> for EventId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub i64);

impl TicketId {
    /// Get the underlying integer.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for TicketId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
