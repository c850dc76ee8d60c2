//! Event listing handlers.
//!
//! ```text
//! GET /api/v1/events
//! GET /api/v1/events/{eventId}
//! ```
//!
//! The catalogue is public; details require a signed-in caller.

use actix_web::{HttpResponse, get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EventCatalogue, EventId, EventPhase, ListedEvent};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

const EVENT_ID: FieldName = FieldName::new("eventId");

/// Accepted team size range.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamSizeResponse {
    pub min: i32,
    pub max: i32,
}

/// One event as shown on the listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub venue: Option<String>,
    /// `solo` or `team`; absent when the team bounds are inconsistent.
    pub shape: Option<String>,
    /// `upcoming`, `ongoing`, or `past`.
    pub phase: String,
    pub event_start: Option<String>,
    pub event_end: Option<String>,
    pub duration_days: Option<i64>,
    pub reg_open: bool,
    pub reg_start: Option<String>,
    pub reg_end: Option<String>,
    pub is_registration_full: bool,
    pub registrations_count: i64,
    pub max_registrations: Option<i32>,
    /// Fee per capacity unit as a two-place decimal string.
    pub fee_amount: String,
    pub team: TeamSizeResponse,
    /// `active` or `inactive`.
    pub status: String,
}

const fn phase_label(phase: EventPhase) -> &'static str {
    match phase {
        EventPhase::Upcoming => "upcoming",
        EventPhase::Ongoing => "ongoing",
        EventPhase::Past => "past",
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|at| at.to_rfc3339())
}

impl From<ListedEvent> for EventResponse {
    fn from(value: ListedEvent) -> Self {
        let duration_days = value.listing.duration_days();
        let shape = value.listing.event.shape().ok().map(|shape| shape.to_string());
        let ListedEvent {
            listing,
            phase,
            registration_open,
            registration_full,
        } = value;
        let event = listing.event;
        let schedule = listing.schedule;
        Self {
            id: event.id.get(),
            name: event.name,
            description: schedule.description,
            venue: schedule.venue,
            shape,
            phase: phase_label(phase).to_owned(),
            event_start: timestamp(schedule.starts_at),
            event_end: timestamp(schedule.ends_at),
            duration_days,
            reg_open: registration_open,
            reg_start: timestamp(event.registration_opens),
            reg_end: timestamp(event.registration_closes),
            is_registration_full: registration_full,
            registrations_count: listing.registrations_count,
            max_registrations: event.max_registrations,
            fee_amount: event.fee.to_string(),
            team: TeamSizeResponse {
                min: event.min_team_size,
                max: event.max_team_size,
            },
            status: event.status.as_str().to_owned(),
        }
    }
}

/// Events grouped by schedule phase.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventCatalogueResponse {
    pub upcoming: Vec<EventResponse>,
    pub ongoing: Vec<EventResponse>,
    pub past: Vec<EventResponse>,
}

impl From<EventCatalogue> for EventCatalogueResponse {
    fn from(value: EventCatalogue) -> Self {
        let convert = |group: Vec<ListedEvent>| -> Vec<EventResponse> {
            group.into_iter().map(EventResponse::from).collect()
        };
        Self {
            upcoming: convert(value.upcoming),
            ongoing: convert(value.ongoing),
            past: convert(value.past),
        }
    }
}

/// List every event grouped into upcoming, ongoing, and past.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    responses(
        (status = 200, description = "Event catalogue", body = EventCatalogueResponse),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["events"],
    operation_id = "listEvents",
    security([])
)]
#[get("/events")]
pub async fn list_events(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let catalogue = state.events.catalogue().await?;
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "public, max-age=30"))
        .json(EventCatalogueResponse::from(catalogue)))
}

/// Show one event.
#[utoipa::path(
    get,
    path = "/api/v1/events/{eventId}",
    params(("eventId" = i64, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 400, description = "Invalid event id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Event not found", body = ErrorSchema)
    ),
    tags = ["events"],
    operation_id = "eventDetails",
    security(("bearerAuth" = []))
)]
#[get("/events/{eventId}")]
pub async fn event_details(
    state: web::Data<HttpState>,
    _user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let event_id: EventId = parse_id(&path, EVENT_ID)?;
    let event = state.events.event_details(event_id).await?;
    Ok(HttpResponse::Ok().json(EventResponse::from(event)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, Event, EventListing, EventSchedule, EventStatus, Money};
    use crate::inbound::http::test_utils::{STUDENT_TOKEN, TestPorts, test_app};
    use crate::test_support::clock::fixture_timestamp;
    use actix_web::http::StatusCode;
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::test as actix_test;
    use chrono::Duration;
    use serde_json::Value;

    fn listed(id: i64, phase: EventPhase) -> ListedEvent {
        let start = fixture_timestamp() + Duration::days(2);
        ListedEvent {
            listing: EventListing {
                event: Event {
                    id: EventId::new(id),
                    name: "Robo Race".to_owned(),
                    min_team_size: 2,
                    max_team_size: 4,
                    registration_opens: None,
                    registration_closes: Some(start),
                    fee: Money::from_minor(50_000).expect("fee"),
                    max_registrations: Some(10),
                    status: EventStatus::Active,
                },
                schedule: EventSchedule {
                    description: "Line-following robots".to_owned(),
                    venue: Some("Main Ground".to_owned()),
                    starts_at: Some(start),
                    ends_at: Some(start + Duration::days(1)),
                },
                registrations_count: 10,
            },
            phase,
            registration_open: true,
            registration_full: true,
        }
    }

    #[actix_web::test]
    async fn catalogue_is_public_and_grouped() {
        let mut ports = TestPorts::default();
        ports.events.expect_catalogue().times(1).returning(|| {
            Ok(EventCatalogue {
                upcoming: vec![listed(1, EventPhase::Upcoming)],
                ongoing: Vec::new(),
                past: vec![listed(2, EventPhase::Past)],
            })
        });
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = actix_test::TestRequest::get().uri("/api/v1/events").to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;

        let upcoming = &body["upcoming"][0];
        assert_eq!(upcoming["id"], 1);
        assert_eq!(upcoming["regOpen"], true);
        assert_eq!(upcoming["isRegistrationFull"], true);
        assert_eq!(upcoming["registrationsCount"], 10);
        assert_eq!(upcoming["feeAmount"], "500.00");
        assert_eq!(upcoming["shape"], "team");
        assert_eq!(upcoming["durationDays"], 1);
        assert_eq!(upcoming["team"]["max"], 4);
        assert_eq!(body["ongoing"].as_array().map(Vec::len), Some(0));
        assert_eq!(body["past"][0]["phase"], "past");
    }

    #[actix_web::test]
    async fn details_require_a_signed_in_caller() {
        let mut ports = TestPorts::default();
        ports.events.expect_event_details().never();
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = actix_test::TestRequest::get().uri("/api/v1/events/1").to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn details_render_one_event() {
        let mut ports = TestPorts::default();
        ports
            .events
            .expect_event_details()
            .withf(|id| *id == EventId::new(7))
            .times(1)
            .returning(|_| Ok(listed(7, EventPhase::Upcoming)));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = actix_test::TestRequest::get()
            .uri("/api/v1/events/7")
            .insert_header((AUTHORIZATION, STUDENT_TOKEN))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["venue"], "Main Ground");
        assert_eq!(body["status"], "active");
    }

    #[actix_web::test]
    async fn unknown_events_are_not_found() {
        let mut ports = TestPorts::default();
        ports
            .events
            .expect_event_details()
            .returning(|_| Err(Error::not_found("Event not found")));
        let app = actix_test::init_service(test_app(ports.into_state())).await;

        let request = actix_test::TestRequest::get()
            .uri("/api/v1/events/404")
            .insert_header((AUTHORIZATION, STUDENT_TOKEN))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
