//! Pure decision rules shared by the registration, join, and payment
//! engines.
//!
//! Adapters load and lock rows, then call into these functions so the
//! business decisions stay identical across storage backends and can be unit
//! tested without a database.

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{
    Error, Event, EventShape, ExistingRegistration, RegistrationId, TeamSummary, UserId,
};

/// Business-rule rejection raised inside an engine transaction.
///
/// Every rejection rolls the surrounding transaction back. None of them are
/// worth retrying without the caller changing something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationRejection {
    /// No event with the requested id.
    #[error("Event not found")]
    EventNotFound,
    /// Team size bounds are inconsistent.
    #[error("Invalid event configuration")]
    InvalidEventConfiguration,
    /// Event is not published.
    #[error("Event is not active")]
    EventInactive,
    /// Registration window has not opened.
    #[error("Registration has not started yet")]
    RegistrationNotStarted,
    /// Registration window has closed.
    #[error("Registration has ended")]
    RegistrationClosed,
    /// Caller already holds a paid registration, or is already on a team.
    #[error("You are already registered for this event")]
    AlreadyRegistered,
    /// Paid capacity units reached `max_registrations`.
    #[error("Event registration is full")]
    EventFull,
    /// Explicit team name collides case-insensitively.
    #[error("Team name already exists. Please choose a different name.")]
    TeamNameTaken,
    /// Accommodation id does not exist.
    #[error("Invalid accommodation")]
    InvalidAccommodation,
    /// No materialized team carries the code within the event.
    #[error("Team not found with this code for the specified event")]
    TeamNotFound,
    /// Join attempted on a solo event.
    #[error("Cannot join team for solo events")]
    SoloEvent,
    /// Lead attempted to join their own team.
    #[error("You cannot join your own team")]
    OwnTeam,
    /// Team reached `max_team_size`.
    #[error("Team is already full")]
    TeamFull,
    /// Registration missing or owned by someone else.
    #[error("Registration not found")]
    RegistrationNotFound,
    /// Payment requested for a free event.
    #[error("This event is free. No payment required.")]
    FreeEvent,
    /// Registration already paid.
    #[error("Payment already completed for this registration")]
    AlreadyPaid,
    /// Caller is a team member but not the lead.
    #[error("Only the team lead can pay for the team")]
    NotTeamLead,
    /// No payment carries the order reference.
    #[error("Payment record not found")]
    PaymentNotFound,
    /// Payment has already been completed.
    #[error("Payment already verified")]
    AlreadyVerified,
    /// Check-in attempted for an unpaid registration.
    #[error("Registration has not been paid")]
    NotPaid,
}

/// Taxonomy bucket of a [`RegistrationRejection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Referenced entity does not exist.
    NotFound,
    /// Malformed or unknown input.
    Validation,
    /// Business rule violated by current data.
    StateConflict,
    /// Caller is not allowed to perform the action.
    Forbidden,
}

impl RegistrationRejection {
    /// Taxonomy bucket used for transport mapping.
    #[must_use]
    pub const fn kind(self) -> RejectionKind {
        match self {
            Self::EventNotFound
            | Self::TeamNotFound
            | Self::RegistrationNotFound
            | Self::PaymentNotFound => RejectionKind::NotFound,
            Self::InvalidAccommodation => RejectionKind::Validation,
            Self::NotTeamLead => RejectionKind::Forbidden,
            Self::InvalidEventConfiguration
            | Self::EventInactive
            | Self::RegistrationNotStarted
            | Self::RegistrationClosed
            | Self::AlreadyRegistered
            | Self::EventFull
            | Self::TeamNameTaken
            | Self::SoloEvent
            | Self::OwnTeam
            | Self::TeamFull
            | Self::FreeEvent
            | Self::AlreadyPaid
            | Self::AlreadyVerified
            | Self::NotPaid => RejectionKind::StateConflict,
        }
    }

    /// Machine-readable reason reported in error details.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::EventNotFound => "event_not_found",
            Self::InvalidEventConfiguration => "invalid_event_configuration",
            Self::EventInactive => "event_inactive",
            Self::RegistrationNotStarted => "registration_not_started",
            Self::RegistrationClosed => "registration_closed",
            Self::AlreadyRegistered => "already_registered",
            Self::EventFull => "event_full",
            Self::TeamNameTaken => "team_name_taken",
            Self::InvalidAccommodation => "invalid_accommodation",
            Self::TeamNotFound => "team_not_found",
            Self::SoloEvent => "solo_event",
            Self::OwnTeam => "own_team",
            Self::TeamFull => "team_full",
            Self::RegistrationNotFound => "registration_not_found",
            Self::FreeEvent => "free_event",
            Self::AlreadyPaid => "already_paid",
            Self::NotTeamLead => "not_team_lead",
            Self::PaymentNotFound => "payment_not_found",
            Self::AlreadyVerified => "already_verified",
            Self::NotPaid => "not_paid",
        }
    }

    /// Translate into the transport-agnostic domain error.
    ///
    /// # Examples
    /// ```
    /// use portal_backend::domain::{ErrorCode, RegistrationRejection};
    ///
    /// let error = RegistrationRejection::TeamFull.into_error();
    /// assert_eq!(error.code(), ErrorCode::Conflict);
    /// assert_eq!(error.message(), "Team is already full");
    /// assert!(!error.is_retryable());
    /// ```
    #[must_use]
    pub fn into_error(self) -> Error {
        let message = self.to_string();
        match self.kind() {
            RejectionKind::NotFound => Error::not_found(message),
            RejectionKind::Forbidden => Error::forbidden(message),
            RejectionKind::Validation => Error::invalid_request(message)
                .with_details(json!({ "field": "accommodationId", "reason": self.reason() })),
            RejectionKind::StateConflict => Error::conflict(message)
                .with_details(json!({ "retryable": false, "reason": self.reason() })),
        }
    }
}

impl From<RegistrationRejection> for Error {
    fn from(value: RegistrationRejection) -> Self {
        value.into_error()
    }
}

/// How a register call proceeds once the existing row has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No registration exists; insert a new one.
    Fresh,
    /// An unpaid registration exists; return it so payment can resume.
    Resume(RegistrationId),
}

/// Validate the event configuration, publication state, and window.
///
/// Mirrors checks two to four of the registration engine in order.
pub fn admit_event(event: &Event, now: DateTime<Utc>) -> Result<EventShape, RegistrationRejection> {
    let shape = event.shape()?;
    event.ensure_accepting(now)?;
    Ok(shape)
}

/// Decide whether an existing registration blocks, resumes, or is absent.
pub fn resolve_existing(
    existing: Option<&ExistingRegistration>,
) -> Result<Admission, RegistrationRejection> {
    match existing {
        None => Ok(Admission::Fresh),
        Some(row) if row.payment_status => Err(RegistrationRejection::AlreadyRegistered),
        Some(row) => Ok(Admission::Resume(row.id)),
    }
}

/// Reject when the paid capacity units have reached the event cap.
///
/// A missing or non-positive cap never limits registration.
pub fn ensure_capacity(event: &Event, paid_units: i64) -> Result<(), RegistrationRejection> {
    match event.max_registrations {
        Some(cap) if cap > 0 && paid_units >= i64::from(cap) => {
            Err(RegistrationRejection::EventFull)
        }
        _ => Ok(()),
    }
}

/// Checks applied to a locked team before a new member is admitted.
///
/// The order matches the join engine: solo shape, event state, existing
/// registration, own team, and finally capacity.
pub fn admit_join(
    event: &Event,
    team: &TeamSummary,
    joiner: UserId,
    already_registered: bool,
    now: DateTime<Utc>,
) -> Result<(), RegistrationRejection> {
    if !matches!(event.shape()?, EventShape::Team { .. }) {
        return Err(RegistrationRejection::SoloEvent);
    }
    event.ensure_accepting(now)?;
    if already_registered {
        return Err(RegistrationRejection::AlreadyRegistered);
    }
    if team.lead_id == joiner {
        return Err(RegistrationRejection::OwnTeam);
    }
    if team.is_full() {
        return Err(RegistrationRejection::TeamFull);
    }
    Ok(())
}

/// Facts about a registration needed to decide whether it may be paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayabilityFacts {
    /// Registration owner.
    pub owner: UserId,
    /// Whether the registration is already paid.
    pub payment_status: bool,
    /// Lead of the materialized team, if any.
    pub team_lead: Option<UserId>,
}

/// Decide whether `caller` may open a payment order for a registration.
pub fn check_payable(
    event: &Event,
    facts: PayabilityFacts,
    caller: UserId,
) -> Result<(), RegistrationRejection> {
    if facts.owner != caller {
        return Err(RegistrationRejection::RegistrationNotFound);
    }
    if !event.requires_payment() {
        return Err(RegistrationRejection::FreeEvent);
    }
    if facts.payment_status {
        return Err(RegistrationRejection::AlreadyPaid);
    }
    if facts.team_lead.is_some_and(|lead| lead != caller) {
        return Err(RegistrationRejection::NotTeamLead);
    }
    Ok(())
}

#[cfg(test)]
#[path = "registration_rules_tests.rs"]
mod tests;
