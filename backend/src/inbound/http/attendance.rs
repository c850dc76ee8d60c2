//! Check-in desk and registration report handlers for staff.
//!
//! ```text
//! GET  /api/v1/attendance/{registrationId}
//! POST /api/v1/attendance/{registrationId}/present
//! GET  /api/v1/admin/registrations
//! ```
//!
//! Role checks happen in the attendance service; these handlers only
//! authenticate and translate.

use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{AttendanceRecord, RegistrationId, RegistrationReportEntry, ReportTeam};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::registrations_dto::AccommodationResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

const REGISTRATION_ID: FieldName = FieldName::new("registrationId");

/// Registration details shown at the check-in desk.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceResponse {
    pub registration_id: i64,
    pub name: String,
    pub email: String,
    pub event_name: String,
    pub team_name: Option<String>,
    pub food_preference: String,
    pub accommodation: Option<AccommodationResponse>,
    /// `absent` or `present`.
    pub attendance_status: String,
    pub payment_status: bool,
}

impl From<AttendanceRecord> for AttendanceResponse {
    fn from(value: AttendanceRecord) -> Self {
        Self {
            registration_id: value.registration_id.get(),
            name: value.name,
            email: value.email,
            event_name: value.event_name,
            team_name: value.team_name,
            food_preference: value.food_preference,
            accommodation: value.accommodation.map(AccommodationResponse::from),
            attendance_status: value.attendance_status.as_str().to_owned(),
            payment_status: value.payment_status,
        }
    }
}

/// Team columns of a report row.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportTeamResponse {
    pub team_id: i64,
    pub team_code: String,
    pub team_name: String,
    pub team_lead_name: String,
    pub team_lead_email: String,
}

impl From<ReportTeam> for ReportTeamResponse {
    fn from(value: ReportTeam) -> Self {
        Self {
            team_id: value.team_id.get(),
            team_code: value.code.to_string(),
            team_name: value.name,
            team_lead_name: value.lead_name,
            team_lead_email: value.lead_email,
        }
    }
}

/// One row of the staff registration report.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationReportRow {
    pub registration_id: i64,
    /// RFC 3339 registration time.
    pub timestamp: String,
    pub event_id: i64,
    pub event_name: String,
    pub student_id: i64,
    pub student_name: String,
    pub student_email: String,
    pub role: String,
    pub attendance_status: String,
    pub payment_status: bool,
    pub food_preference: String,
    pub team: Option<ReportTeamResponse>,
}

impl From<RegistrationReportEntry> for RegistrationReportRow {
    fn from(value: RegistrationReportEntry) -> Self {
        Self {
            registration_id: value.registration_id.get(),
            timestamp: value.registered_at.to_rfc3339(),
            event_id: value.event_id.get(),
            event_name: value.event_name,
            student_id: value.student_id.get(),
            student_name: value.student_name,
            student_email: value.student_email,
            role: value.student_role.as_str().to_owned(),
            attendance_status: value.attendance_status.as_str().to_owned(),
            payment_status: value.payment_status,
            food_preference: value.food_preference,
            team: value.team.map(ReportTeamResponse::from),
        }
    }
}

/// Body of `GET /admin/registrations`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationReportResponse {
    /// Registrations, newest first.
    pub registrations: Vec<RegistrationReportRow>,
}

/// Look up a registration for check-in.
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{registrationId}",
    params(("registrationId" = i64, Path, description = "Registration identifier")),
    responses(
        (status = 200, description = "Registration details", body = AttendanceResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not staff", body = ErrorSchema),
        (status = 404, description = "Registration not found", body = ErrorSchema)
    ),
    tags = ["attendance"],
    operation_id = "lookupAttendance",
    security(("bearerAuth" = []))
)]
#[get("/attendance/{registrationId}")]
pub async fn lookup_attendance(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let registration_id: RegistrationId = parse_id(&path, REGISTRATION_ID)?;
    let record = state
        .attendance
        .lookup(user.identity(), registration_id)
        .await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(record)))
}

/// Mark a paid registration present.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/{registrationId}/present",
    params(("registrationId" = i64, Path, description = "Registration identifier")),
    responses(
        (status = 200, description = "Marked present", body = AttendanceResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not staff", body = ErrorSchema),
        (status = 404, description = "Registration not found", body = ErrorSchema),
        (status = 409, description = "Registration is not paid", body = ErrorSchema)
    ),
    tags = ["attendance"],
    operation_id = "markPresent",
    security(("bearerAuth" = []))
)]
#[post("/attendance/{registrationId}/present")]
pub async fn mark_present(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let registration_id: RegistrationId = parse_id(&path, REGISTRATION_ID)?;
    let record = state
        .attendance
        .mark_present(user.identity(), registration_id)
        .await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::from(record)))
}

/// Every registration with registrant, event, and team details.
#[utoipa::path(
    get,
    path = "/api/v1/admin/registrations",
    responses(
        (status = 200, description = "Registration report", body = RegistrationReportResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Caller is not staff", body = ErrorSchema)
    ),
    tags = ["attendance"],
    operation_id = "registrationReport",
    security(("bearerAuth" = []))
)]
#[get("/admin/registrations")]
pub async fn registration_report(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let entries = state.attendance.registration_report(user.identity()).await?;
    let body = RegistrationReportResponse {
        registrations: entries.into_iter().map(RegistrationReportRow::from).collect(),
    };
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "private, no-store"))
        .json(body))
}
