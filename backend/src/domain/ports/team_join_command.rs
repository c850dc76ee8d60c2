//! Driving port for joining an existing team.

use async_trait::async_trait;

use crate::domain::{AccommodationId, Error, EventId, FoodPreference, Identity, JoinOutcome};

/// Request to join a team by code.
///
/// The code is validated by the service before any storage access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTeamRequest {
    /// Authenticated caller.
    pub user: Identity,
    /// Target event.
    pub event_id: EventId,
    /// Raw join code as supplied.
    pub team_code: String,
    /// Selected accommodation.
    pub accommodation_id: Option<AccommodationId>,
    /// Selected food preference.
    pub food_preference: FoodPreference,
}

/// Team join engine entry point.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeamJoinCommand: Send + Sync {
    /// Add the caller to the team carrying the code.
    async fn join_team(&self, request: JoinTeamRequest) -> Result<JoinOutcome, Error>;
}
