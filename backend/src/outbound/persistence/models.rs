//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types return a
//! `String` describing the first invalid column so repositories can map it
//! into their own query error.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    Accommodation, AccommodationId, AttendanceStatus, Event, EventId, EventListing, EventSchedule,
    EventStatus, Identity, Money, PaymentDetails, PaymentId, PaymentStatus, RegistrationId,
    TeamCode, TeamId, UserId, UserRole,
};

use super::schema::{
    accommodations, events, payments, registrations, team_registrations, teams, users,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl TryFrom<UserRow> for Identity {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = row.role.parse().map_err(|err| format!("{err}"))?;
        Ok(Self {
            user_id: UserId::new(row.user_id),
            name: row.name,
            email: row.email,
            role,
        })
    }
}

// ---------------------------------------------------------------------------
// Events and accommodations
// ---------------------------------------------------------------------------

/// Row struct for reading from the events table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventRow {
    pub event_id: i64,
    pub event_name: String,
    pub min_team_size: i32,
    pub max_team_size: i32,
    pub reg_start_time: Option<DateTime<Utc>>,
    pub reg_end_time: Option<DateTime<Utc>>,
    pub fee_amount_minor: i64,
    pub max_registrations: Option<i32>,
    pub status: String,
}

impl TryFrom<EventRow> for Event {
    type Error = String;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let fee = Money::from_minor(row.fee_amount_minor).map_err(|err| err.to_string())?;
        let status: EventStatus = row.status.parse().map_err(|err| format!("{err}"))?;
        Ok(Self {
            id: EventId::new(row.event_id),
            name: row.event_name,
            min_team_size: row.min_team_size,
            max_team_size: row.max_team_size,
            registration_opens: row.reg_start_time,
            registration_closes: row.reg_end_time,
            fee,
            max_registrations: row.max_registrations,
            status,
        })
    }
}

/// Event row extended with the columns only the public listing reads.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventListingRow {
    #[diesel(embed)]
    pub event: EventRow,
    pub event_description: String,
    pub venue: Option<String>,
    pub event_start_time: Option<DateTime<Utc>>,
    pub event_end_time: Option<DateTime<Utc>>,
}

/// The taken-capacity count is not a column; it starts at zero and the
/// repository fills it in.
impl TryFrom<EventListingRow> for EventListing {
    type Error = String;

    fn try_from(row: EventListingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            event: Event::try_from(row.event)?,
            schedule: EventSchedule {
                description: row.event_description,
                venue: row.venue,
                starts_at: row.event_start_time,
                ends_at: row.event_end_time,
            },
            registrations_count: 0,
        })
    }
}

/// Row struct for reading from the accommodations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accommodations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccommodationRow {
    pub accommodation_id: i32,
    pub accommodation: String,
}

impl From<AccommodationRow> for Accommodation {
    fn from(row: AccommodationRow) -> Self {
        Self {
            id: AccommodationId::new(row.accommodation_id),
            name: row.accommodation,
        }
    }
}

// ---------------------------------------------------------------------------
// Registrations
// ---------------------------------------------------------------------------

/// Row struct for reading from the registrations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RegistrationRow {
    pub registration_id: i64,
    pub student_id: i64,
    pub event_id: i64,
    pub payment_status: bool,
    pub accommodation_id: Option<i32>,
    pub food_preference: String,
    pub attendance_status: String,
    pub pending_team_name: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl RegistrationRow {
    pub(crate) fn id(&self) -> RegistrationId {
        RegistrationId::new(self.registration_id)
    }

    pub(crate) fn attendance(&self) -> Result<AttendanceStatus, String> {
        self.attendance_status
            .parse()
            .map_err(|err| format!("{err}"))
    }
}

/// Insertable struct for creating registrations.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = registrations)]
pub(crate) struct NewRegistrationRow<'a> {
    pub student_id: i64,
    pub event_id: i64,
    pub payment_status: bool,
    pub accommodation_id: Option<i32>,
    pub food_preference: &'a str,
    pub pending_team_name: Option<&'a str>,
    pub registered_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// Row struct for reading from the teams table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TeamRow {
    pub team_id: i64,
    pub event_id: i64,
    pub team_name: String,
    pub team_code: String,
    pub team_lead_id: i64,
}

impl TeamRow {
    pub(crate) fn id(&self) -> TeamId {
        TeamId::new(self.team_id)
    }

    pub(crate) fn code(&self) -> Result<TeamCode, String> {
        TeamCode::parse(&self.team_code).map_err(|err| err.to_string())
    }
}

/// Insertable struct for materializing teams.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = teams)]
pub(crate) struct NewTeamRow<'a> {
    pub event_id: i64,
    pub team_name: &'a str,
    pub team_code: &'a str,
    pub team_lead_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for membership links.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = team_registrations)]
pub(crate) struct NewTeamRegistrationRow {
    pub registration_id: i64,
    pub team_id: i64,
    pub joined_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Payments
// ---------------------------------------------------------------------------

/// Row struct for reading from the payments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub payment_id: i64,
    pub registration_id: i64,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub amount_minor: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRow {
    pub(crate) fn payment_status(&self) -> Result<PaymentStatus, String> {
        self.status.parse().map_err(|err| format!("{err}"))
    }
}

impl TryFrom<PaymentRow> for PaymentDetails {
    type Error = String;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = row.payment_status()?;
        let amount = Money::from_minor(row.amount_minor).map_err(|err| err.to_string())?;
        Ok(Self {
            payment_id: PaymentId::new(row.payment_id),
            order_id: row.gateway_order_id,
            gateway_payment_id: row.gateway_payment_id,
            amount,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insertable struct for pending payments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub(crate) struct NewPaymentRow<'a> {
    pub registration_id: i64,
    pub gateway_order_id: &'a str,
    pub amount_minor: i64,
    pub currency: &'a str,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
