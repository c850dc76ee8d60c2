//! Driving port for registering for events.

use async_trait::async_trait;

use crate::domain::{
    AccommodationId, Error, EventId, FoodPreference, Identity, RegistrationOutcome, TeamName,
};

/// Request to register the caller for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    /// Authenticated caller.
    pub user: Identity,
    /// Target event.
    pub event_id: EventId,
    /// Explicit team name; a name is generated when absent.
    pub team_name: Option<TeamName>,
    /// Selected accommodation.
    pub accommodation_id: Option<AccommodationId>,
    /// Selected food preference.
    pub food_preference: FoodPreference,
}

/// Registration engine entry point.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationCommand: Send + Sync {
    /// Register the caller, resuming an unpaid registration if one exists.
    ///
    /// # Errors
    ///
    /// Returns `not_found`, `invalid_request`, or `conflict` for rejected
    /// requests, and a retryable `conflict` when the store aborts the
    /// transaction.
    async fn register(&self, request: RegisterRequest) -> Result<RegistrationOutcome, Error>;
}
