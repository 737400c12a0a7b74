//! HTTP-level tests: request parsing, routing, and the error→status mapping
//! of §6/§7, driven end to end through the router with `tower::ServiceExt`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use ticketing_cache::{InMemoryCache, LocalLockManager};
use ticketing_common::{CacheConfig, Event, EventDraft, EventId, EventSortKey, LockConfig, Page, ReservationConfig, Ticket, TicketId, TicketStatus, TicketingError};
use ticketing_engine::{ReadPathService, ReservationEngine};
use ticketing_store::{EventRepository, TicketRepository};
use ticketing_web::{build_router, AppState};
use tokio::sync::Mutex;
use tower::ServiceExt;

struct FakeStore {
    events: Mutex<Vec<Event>>,
    tickets: Mutex<Vec<Ticket>>,
    next_ticket_id: AtomicI64,
}

impl FakeStore {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            tickets: Mutex::new(Vec::new()),
            next_ticket_id: AtomicI64::new(1),
        }
    }
}

#[async_trait::async_trait]
impl EventRepository for FakeStore {
    async fn create(&self, draft: &EventDraft) -> Result<Event, TicketingError> {
        let mut events = self.events.lock().await;
        let id = EventId(events.len() as i64 + 1);
        let event = Event {
            id,
            name: draft.name.clone(),
            venue: draft.venue.clone(),
            event_date: draft.event_date,
            total_tickets: draft.total_tickets,
            available_tickets: draft.total_tickets as i64,
        };
        events.push(event.clone());

        let mut tickets = self.tickets.lock().await;
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

        Ok(event)
    }

    async fn get(&self, id: EventId) -> Result<Option<Event>, TicketingError> {
        Ok(self.events.lock().await.iter().find(|e| e.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Event>, TicketingError> {
        Ok(self.events.lock().await.clone())
    }

    async fn list_paged(
        &self,
        page: u32,
        size: u32,
        _sort: EventSortKey,
    ) -> Result<Page<Event>, TicketingError> {
        let events = self.events.lock().await.clone();
        Ok(Page {
            total: events.len() as i64,
            items: events,
            page,
            size,
        })
    }

    async fn list_available(&self) -> Result<Vec<Event>, TicketingError> {
        Ok(self
            .events
            .lock()
            .await
            .iter()
            .filter(|e| e.available_tickets > 0)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl TicketRepository for FakeStore {
    async fn reserve_one(
        &self,
        event_id: EventId,
        customer_email: &str,
        window: Duration,
    ) -> Result<Ticket, TicketingError> {
        let mut tickets = self.tickets.lock().await;
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
        Ok(self
            .tickets
            .lock()
            .await
            .iter()
            .filter(|t| t.event_id == event_id && t.status == TicketStatus::Available)
            .count() as i64)
    }

    async fn list_available(&self, event_id: EventId) -> Result<Vec<Ticket>, TicketingError> {
        Ok(self
            .tickets
            .lock()
            .await
            .iter()
            .filter(|t| t.event_id == event_id && t.status == TicketStatus::Available)
            .cloned()
            .collect())
    }

    async fn list_by_customer(&self, email: &str) -> Result<Vec<Ticket>, TicketingError> {
        Ok(self
            .tickets
            .lock()
            .await
            .iter()
            .filter(|t| t.customer_email.as_deref() == Some(email))
            .cloned()
            .collect())
    }

    async fn reap_expired(&self, _now: chrono::DateTime<Utc>) -> Result<Vec<EventId>, TicketingError> {
        Ok(vec![])
    }
}

fn app() -> axum::Router {
    let store = Arc::new(FakeStore::new());
    let cache = Arc::new(InMemoryCache::default());
    let locks = Arc::new(LocalLockManager::new());

    let reservations = Arc::new(ReservationEngine::new(
        store.clone(),
        store.clone(),
        cache.clone(),
        locks,
        ReservationConfig::default(),
        LockConfig::default(),
    ));
    let read_path = Arc::new(ReadPathService::new(store.clone(), store, cache, CacheConfig::default()));

    build_router(AppState::new(reservations, read_path))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_event_then_get_roundtrips() {
    let app = app();

    let create = Request::builder()
        .method("POST")
        .uri("/api/v1/events")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "name": "Spring Concert",
                "venue": "Madison Square Garden",
                "eventDate": (Utc::now() + Duration::days(30)).to_rfc3339(),
                "totalTickets": 3
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["availableTickets"], 3);
    let id = created["id"].as_i64().unwrap();

    let get = Request::builder()
        .uri(format!("/api/v1/events/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(get).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["availableTickets"], 3);
}

#[tokio::test]
async fn create_event_with_past_date_is_400() {
    let app = app();
    let create = Request::builder()
        .method("POST")
        .uri("/api/v1/events")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "name": "Old Show",
                "venue": "Somewhere",
                "eventDate": (Utc::now() - Duration::days(1)).to_rfc3339(),
                "totalTickets": 10
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("future"));
    assert_eq!(body["path"], "/api/v1/events");
}

#[tokio::test]
async fn reserve_unknown_event_is_404() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/tickets/reserve?eventId=99999&customerEmail=a@x.com")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Event"));
}

#[tokio::test]
async fn reserve_malformed_email_is_400_and_untouched() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/tickets/reserve?eventId=1&customerEmail=invalid-email")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reserve_sold_out_event_is_409() {
    let app = app();

    let create = Request::builder()
        .method("POST")
        .uri("/api/v1/events")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "name": "One Seat Show",
                "venue": "Small Hall",
                "eventDate": (Utc::now() + Duration::days(10)).to_rfc3339(),
                "totalTickets": 1
            })
            .to_string(),
        ))
        .unwrap();
    let created = body_json(app.clone().oneshot(create).await.unwrap()).await;
    let id = created["id"].as_i64().unwrap();

    let reserve_one = |email: &str| {
        Request::builder()
            .method("POST")
            .uri(format!("/api/v1/tickets/reserve?eventId={id}&customerEmail={email}"))
            .body(Body::empty())
            .unwrap()
    };

    let first = app.clone().oneshot(reserve_one("a@x.com")).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(reserve_one("b@x.com")).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn get_event_with_non_positive_id_is_400() {
    let app = app();
    let request = Request::builder()
        .uri("/api/v1/events/0")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_event_not_found_is_404() {
    let app = app();
    let request = Request::builder()
        .uri("/api/v1/events/42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let app = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}
