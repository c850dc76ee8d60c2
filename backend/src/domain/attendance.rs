//! Staff views of registrations: the check-in record and the registration
//! report.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{
    Accommodation, AttendanceStatus, EventId, RegistrationId, TeamCode, TeamId, UserId, UserRole,
};

/// Registration as seen by the check-in desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRecord {
    /// Registration identifier.
    pub registration_id: RegistrationId,
    /// Registrant display name.
    pub name: String,
    /// Registrant email.
    pub email: String,
    /// Event display name.
    pub event_name: String,
    /// Team name for team events.
    pub team_name: Option<String>,
    /// Selected food preference.
    pub food_preference: String,
    /// Selected accommodation.
    pub accommodation: Option<Accommodation>,
    /// Current check-in state.
    pub attendance_status: AttendanceStatus,
    /// Whether the registration is paid.
    pub payment_status: bool,
}

/// Team side of a report row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTeam {
    pub team_id: TeamId,
    pub code: TeamCode,
    pub name: String,
    pub lead_name: String,
    pub lead_email: String,
}

/// One registration in the staff report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReportEntry {
    pub registration_id: RegistrationId,
    pub registered_at: DateTime<Utc>,
    pub event_id: EventId,
    pub event_name: String,
    pub student_id: UserId,
    pub student_name: String,
    pub student_email: String,
    pub student_role: UserRole,
    pub attendance_status: AttendanceStatus,
    pub payment_status: bool,
    pub food_preference: String,
    /// Team the registration belongs to; `None` for solo events and for
    /// leads whose team is still pending payment.
    pub team: Option<ReportTeam>,
}
