//! Port for the transactional registration and join engines.
//!
//! Adapters run each call in one serializable transaction, lock the rows
//! they read before writing, and apply the rules in
//! [`crate::domain::registration_rules`] in the documented order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Accommodation, AccommodationId, EventId, EventShape, FoodPreference, JoinOutcome, Money,
    RegistrationId, RegistrationOutcome, RegistrationRejection, RegistrationStatus,
    TeamAssignment, TeamCode, TeamNameChoice, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by registration repository adapters.
    pub enum RegistrationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "registration repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "registration repository query failed: {message}",
        /// The store aborted the transaction (serialization failure, deadlock,
        /// or lock timeout). Safe to retry.
        Conflict { message: String } =>
            "registration transaction aborted: {message}",
        /// A generated team name lost a race on the unique name index.
        NameCollision { name: String } =>
            "generated team name already taken: {name}",
        /// A business rule rejected the request.
        Rejected { rejection: RegistrationRejection } => "{rejection}",
    }
}

impl From<RegistrationRejection> for RegistrationRepositoryError {
    fn from(rejection: RegistrationRejection) -> Self {
        Self::Rejected { rejection }
    }
}

/// Input for one register attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDraft {
    /// Registrant.
    pub user_id: UserId,
    /// Target event.
    pub event_id: EventId,
    /// Team name strategy; ignored for solo events.
    pub team_name: TeamNameChoice,
    /// Selected accommodation.
    pub accommodation_id: Option<AccommodationId>,
    /// Selected food preference.
    pub food_preference: FoodPreference,
    /// Clock reading used for window checks and timestamps.
    pub now: DateTime<Utc>,
}

/// Input for one join attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinDraft {
    /// Joining user.
    pub user_id: UserId,
    /// Target event.
    pub event_id: EventId,
    /// Normalised join code.
    pub team_code: TeamCode,
    /// Selected accommodation.
    pub accommodation_id: Option<AccommodationId>,
    /// Selected food preference.
    pub food_preference: FoodPreference,
    /// Clock reading used for window checks and timestamps.
    pub now: DateTime<Utc>,
}

/// Transactional registration storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Register `draft.user_id` for `draft.event_id`.
    ///
    /// An unpaid existing registration is returned with `resumed = true`
    /// instead of inserting a duplicate.
    async fn register(
        &self,
        draft: &RegistrationDraft,
    ) -> Result<RegistrationOutcome, RegistrationRepositoryError>;

    /// Admit `draft.user_id` to the team carrying `draft.team_code`.
    async fn join_team(&self, draft: &JoinDraft)
    -> Result<JoinOutcome, RegistrationRepositoryError>;

    /// Report the user's registration and team state for an event.
    async fn status(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<RegistrationStatus, RegistrationRepositoryError>;

    /// List accommodation options ordered by name.
    async fn accommodations(&self) -> Result<Vec<Accommodation>, RegistrationRepositoryError>;
}

/// Fixture implementation that accepts every solo registration for free.
///
/// Joins always fail with "team not found" and nobody is registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRegistrationRepository;

#[async_trait]
impl RegistrationRepository for FixtureRegistrationRepository {
    async fn register(
        &self,
        draft: &RegistrationDraft,
    ) -> Result<RegistrationOutcome, RegistrationRepositoryError> {
        Ok(RegistrationOutcome {
            registration_id: RegistrationId::new(1),
            event_id: draft.event_id,
            event_name: format!("Event {}", draft.event_id),
            shape: EventShape::Solo,
            fee: Money::ZERO,
            payment_status: true,
            registered_at: draft.now,
            accommodation: None,
            food_preference: draft.food_preference.clone(),
            team: TeamAssignment::None,
            resumed: false,
        })
    }

    async fn join_team(
        &self,
        _draft: &JoinDraft,
    ) -> Result<JoinOutcome, RegistrationRepositoryError> {
        Err(RegistrationRejection::TeamNotFound.into())
    }

    async fn status(
        &self,
        _user_id: UserId,
        _event_id: EventId,
    ) -> Result<RegistrationStatus, RegistrationRepositoryError> {
        Ok(RegistrationStatus::NotRegistered)
    }

    async fn accommodations(&self) -> Result<Vec<Accommodation>, RegistrationRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;

    fn draft() -> RegistrationDraft {
        RegistrationDraft {
            user_id: UserId::new(1),
            event_id: EventId::new(7),
            team_name: TeamNameChoice::Generated {
                base: "Ada's Team".to_owned(),
            },
            accommodation_id: None,
            food_preference: FoodPreference::default(),
            now: Utc
                .with_ymd_and_hms(2026, 1, 5, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    #[tokio::test]
    async fn fixture_registers_free_solo() {
        let outcome = FixtureRegistrationRepository
            .register(&draft())
            .await
            .expect("fixture registers");
        assert!(outcome.payment_status);
        assert!(!outcome.payment_required());
        assert_eq!(outcome.event_id, EventId::new(7));
    }

    #[tokio::test]
    async fn fixture_reports_not_registered() {
        let status = FixtureRegistrationRepository
            .status(UserId::new(1), EventId::new(7))
            .await
            .expect("fixture status");
        assert_eq!(status, RegistrationStatus::NotRegistered);
    }

    #[test]
    fn rejection_converts_into_error() {
        let error = RegistrationRepositoryError::from(RegistrationRejection::TeamFull);
        assert_eq!(error.to_string(), "Team is already full");
    }
}
