//! Core domain types: events, tickets, and the ticket lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TicketingError;
use crate::ids::{EventId, TicketId};

/// A sort key for paginated event listings (§4.4 `listEventsPaged`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventSortKey {
    #[default]
    Id,
    EventDate,
    Name,
}

impl EventSortKey {
    /// Column to order by; whitelisted so a sort key never reaches SQL as a
    /// free-form string.
    pub fn column(&self) -> &'static str {
        match self {
            EventSortKey::Id => "id",
            EventSortKey::EventDate => "event_date",
            EventSortKey::Name => "name",
        }
    }
}

impl std::str::FromStr for EventSortKey {
    type Err = TicketingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(EventSortKey::Id),
            "eventDate" | "event_date" => Ok(EventSortKey::EventDate),
            "name" => Ok(EventSortKey::Name),
            other => Err(TicketingError::ValidationFailed(format!(
                "unknown sort key '{other}'"
            ))),
        }
    }
}

/// A page of results with the total count of matching rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total: i64,
}

/// A scheduled event with a fixed ticket inventory.
///
/// `available_tickets` is derived from the child tickets, never stored,
/// see the durable store's count query. Maintaining it as a column would be
/// a second source of truth for the same fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub venue: String,
    pub event_date: DateTime<Utc>,
    pub total_tickets: i32,
    pub available_tickets: i64,
}

/// Input for creating a new event, before an id has been assigned (§6: the
/// `Event` request body uses the same camelCase field names as the
/// response).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub name: String,
    pub venue: String,
    pub event_date: DateTime<Utc>,
    pub total_tickets: i32,
}

impl EventDraft {
    /// Validate every constraint in §3/§6 of the specification, collecting
    /// all violations rather than stopping at the first.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), TicketingError> {
        let mut violations = Vec::new();

        let name_len = self.name.trim().chars().count();
        if self.name.trim().is_empty() || !(3..=100).contains(&name_len) {
            violations.push("name must be 3-100 non-blank characters".to_string());
        }

        let venue_len = self.venue.trim().chars().count();
        if self.venue.trim().is_empty() || !(3..=255).contains(&venue_len) {
            violations.push("venue must be 3-255 non-blank characters".to_string());
        }

        if self.event_date <= now {
            violations.push("eventDate must be strictly in the future".to_string());
        }

        if self.total_tickets < 1 {
            violations.push("totalTickets must be at least 1".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(TicketingError::ValidationFailed(violations.join("; ")))
        }
    }
}

/// Lifecycle state of a single seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketStatus {
    Available,
    Reserved,
    /// Defined for schema completeness; no transition into this state is
    /// implemented by the core (payment/order finalisation is out of scope).
    Sold,
}

impl TicketStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            TicketStatus::Available => "AVAILABLE",
            TicketStatus::Reserved => "RESERVED",
            TicketStatus::Sold => "SOLD",
        }
    }

    pub fn parse_db_str(s: &str) -> Self {
        match s {
            "RESERVED" => TicketStatus::Reserved,
            "SOLD" => TicketStatus::Sold,
            _ => TicketStatus::Available,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// One seat within an event's inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub event_id: EventId,
    pub status: TicketStatus,
    pub customer_email: Option<String>,
    pub reserved_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Ticket {
    /// I2/I3: the invariant linking status to the nullability of the
    /// customer and expiry fields. Exposed so both the store layer and
    /// tests can assert it without duplicating the rule.
    pub fn respects_status_invariant(&self) -> bool {
        match self.status {
            TicketStatus::Reserved => self.customer_email.is_some() && self.reserved_until.is_some(),
            TicketStatus::Available => self.customer_email.is_none() && self.reserved_until.is_none(),
            TicketStatus::Sold => true,
        }
    }
}

/// Validate a reservation request's email constraint (§6): non-blank,
/// RFC-style address. A permissive hand check is used rather than a full
/// RFC 5322 grammar, matching the "well-formed" wording in the spec.
pub fn validate_customer_email(email: &str) -> Result<(), TicketingError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(TicketingError::ValidationFailed(
            "customerEmail must not be blank".to_string(),
        ));
    }
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(TicketingError::ValidationFailed(format!(
            "customerEmail '{trimmed}' is not a well-formed email address"
        )))
    }
}

/// Validate a positive event id (§6: `eventId` positive integer).
pub fn validate_event_id(id: i64) -> Result<EventId, TicketingError> {
    if id > 0 {
        Ok(EventId(id))
    } else {
        Err(TicketingError::ValidationFailed(
            "eventId must be a positive integer".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(total: i32, future_days: i64) -> EventDraft {
        EventDraft {
            name: "Spring Concert".to_string(),
            venue: "MSG".to_string(),
            event_date: Utc::now() + Duration::days(future_days),
            total_tickets: total,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft(3, 30).validate(Utc::now()).is_ok());
    }

    #[test]
    fn past_event_date_rejected() {
        let d = draft(10, -1);
        let err = d.validate(Utc::now()).unwrap_err();
        assert!(err.to_string().contains("future"));
    }

    #[test]
    fn zero_total_tickets_rejected() {
        let d = draft(0, 30);
        assert!(d.validate(Utc::now()).is_err());
    }

    #[test]
    fn blank_name_rejected() {
        let mut d = draft(3, 30);
        d.name = "  ".to_string();
        assert!(d.validate(Utc::now()).is_err());
    }

    #[test]
    fn multiple_violations_are_all_reported() {
        let mut d = draft(0, -5);
        d.name = "x".to_string();
        let err = d.validate(Utc::now()).unwrap_err().to_string();
        assert!(err.contains("name"));
        assert!(err.contains("future"));
        assert!(err.contains("totalTickets"));
    }

    #[test]
    fn email_validation() {
        assert!(validate_customer_email("a@x.com").is_ok());
        assert!(validate_customer_email("").is_err());
        assert!(validate_customer_email("invalid-email").is_err());
        assert!(validate_customer_email("a@b").is_err());
    }

    #[test]
    fn event_id_validation() {
        assert!(validate_event_id(1).is_ok());
        assert!(validate_event_id(0).is_err());
        assert!(validate_event_id(-5).is_err());
    }

    #[test]
    fn status_invariant_available() {
        let t = Ticket {
            id: TicketId(1),
            event_id: EventId(1),
            status: TicketStatus::Available,
            customer_email: None,
            reserved_until: None,
            created_at: Utc::now(),
        };
        assert!(t.respects_status_invariant());
    }

    #[test]
    fn status_invariant_reserved_requires_fields() {
        let t = Ticket {
            id: TicketId(1),
            event_id: EventId(1),
            status: TicketStatus::Reserved,
            customer_email: None,
            reserved_until: None,
            created_at: Utc::now(),
        };
        assert!(!t.respects_status_invariant());
    }
}
