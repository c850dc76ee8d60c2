//! Registration HTTP handlers.
//!
//! ```text
//! POST /api/v1/registrations
//! POST /api/v1/registrations/join-team
//! GET  /api/v1/registrations/status/{eventId}
//! ```

use actix_web::{HttpResponse, get, post, web};

use crate::domain::ports::{JoinTeamRequest, RegisterRequest};
use crate::domain::{AccommodationId, EventId, FoodPreference};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::registrations_dto::{
    JoinTeamRequestBody, JoinTeamResponse, RegisterRequestBody, RegistrationResponse,
    RegistrationStatusResponse,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_team_name, require};

const EVENT_ID: FieldName = FieldName::new("eventId");
const TEAM_NAME: FieldName = FieldName::new("teamName");
const TEAM_CODE: FieldName = FieldName::new("teamCode");

/// Register the caller for an event.
#[utoipa::path(
    post,
    path = "/api/v1/registrations",
    request_body = RegisterRequestBody,
    responses(
        (
            status = 201,
            description = "Registration created or resumed",
            body = RegistrationResponse
        ),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Event not found", body = ErrorSchema),
        (
            status = 409,
            description = "Rejected by registration rules or retryable conflict",
            body = ErrorSchema
        )
    ),
    tags = ["registrations"],
    operation_id = "register",
    security(("bearerAuth" = []))
)]
#[post("/registrations")]
pub async fn register(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<RegisterRequestBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let request = RegisterRequest {
        event_id: EventId::new(require(body.event_id, EVENT_ID)?),
        team_name: parse_team_name(body.team_name, TEAM_NAME)?,
        accommodation_id: body.accommodation_id.map(AccommodationId::new),
        food_preference: FoodPreference::from_optional(body.food_pref.as_deref()),
        user: user.into_identity(),
    };
    let outcome = state.registrations.register(request).await?;
    Ok(HttpResponse::Created().json(RegistrationResponse::from(outcome)))
}

/// Join an existing team by its code.
#[utoipa::path(
    post,
    path = "/api/v1/registrations/join-team",
    request_body = JoinTeamRequestBody,
    responses(
        (status = 201, description = "Joined the team", body = JoinTeamResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Team not found", body = ErrorSchema),
        (
            status = 409,
            description = "Rejected by join rules or retryable conflict",
            body = ErrorSchema
        )
    ),
    tags = ["registrations"],
    operation_id = "joinTeam",
    security(("bearerAuth" = []))
)]
#[post("/registrations/join-team")]
pub async fn join_team(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<JoinTeamRequestBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let request = JoinTeamRequest {
        event_id: EventId::new(require(body.event_id, EVENT_ID)?),
        team_code: require(body.team_code, TEAM_CODE)?,
        accommodation_id: body.accommodation_id.map(AccommodationId::new),
        food_preference: FoodPreference::from_optional(body.food_pref.as_deref()),
        user: user.into_identity(),
    };
    let outcome = state.team_join.join_team(request).await?;
    Ok(HttpResponse::Created().json(JoinTeamResponse::from(outcome)))
}

/// Report the caller's registration and team state for an event.
#[utoipa::path(
    get,
    path = "/api/v1/registrations/status/{eventId}",
    params(("eventId" = i64, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Registration status", body = RegistrationStatusResponse),
        (status = 400, description = "Invalid event id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["registrations"],
    operation_id = "registrationStatus",
    security(("bearerAuth" = []))
)]
#[get("/registrations/status/{eventId}")]
pub async fn registration_status(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let event_id: EventId = parse_id(&path, EVENT_ID)?;
    let status = state
        .registration_query
        .status(user.identity().user_id, event_id)
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "private, no-cache"))
        .json(RegistrationStatusResponse::from(status)))
}

#[cfg(test)]
#[path = "registrations_tests.rs"]
mod tests;
