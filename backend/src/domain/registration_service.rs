//! Registration and team join engines.
//!
//! The services own the parts of each workflow that sit outside the
//! database transaction: choosing the team name strategy, validating join
//! codes before touching the store, retrying generated-name collisions, and
//! dispatching confirmations after commit.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    JoinDraft, JoinTeamRequest, RegisterRequest, RegistrationCommand, RegistrationDraft,
    RegistrationQuery, RegistrationRepository, RegistrationRepositoryError, TeamJoinCommand,
};
use crate::domain::{
    Accommodation, Error, EventId, EventShape, Identity, JoinOutcome, NoticeTeam,
    NotificationDispatcher, RegistrationNotice, RegistrationOutcome, RegistrationStatus, TeamCode,
    TeamNameChoice, UserId,
};

/// Attempts made when a generated team name loses a race.
pub const NAME_COLLISION_ATTEMPTS: usize = 3;

pub(crate) fn map_registration_error(error: RegistrationRepositoryError) -> Error {
    match error {
        RegistrationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("registration repository unavailable: {message}"))
        }
        RegistrationRepositoryError::Query { message } => {
            Error::internal(format!("registration repository error: {message}"))
        }
        RegistrationRepositoryError::Conflict { message } => {
            debug!(%message, "registration transaction aborted");
            Error::retryable_conflict(
                "Registration conflicted with a concurrent request. Please retry.",
            )
        }
        RegistrationRepositoryError::NameCollision { name } => {
            debug!(%name, "generated team name retries exhausted");
            Error::retryable_conflict("Could not reserve a team name. Please retry.")
        }
        RegistrationRepositoryError::Rejected { rejection } => rejection.into_error(),
    }
}

/// Registration engine implementing [`RegistrationCommand`] and
/// [`RegistrationQuery`].
#[derive(Clone)]
pub struct RegistrationService<R> {
    repo: Arc<R>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
}

impl<R> RegistrationService<R> {
    /// Create a new service.
    pub fn new(repo: Arc<R>, dispatcher: NotificationDispatcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            dispatcher,
            clock,
        }
    }
}

fn registration_notice(user: &Identity, outcome: &RegistrationOutcome) -> RegistrationNotice {
    RegistrationNotice {
        recipient_name: user.name.clone(),
        recipient_email: user.email.clone(),
        event_name: outcome.event_name.clone(),
        shape: outcome.shape,
        fee: outcome.fee,
        team: outcome.team.active().map(|team| NoticeTeam {
            name: team.name.clone(),
            code: team.code.to_string(),
            is_lead: true,
        }),
        accommodation: outcome
            .accommodation
            .as_ref()
            .map(|Accommodation { name, .. }| name.clone()),
        food_preference: outcome.food_preference.to_string(),
    }
}

#[async_trait]
impl<R> RegistrationCommand for RegistrationService<R>
where
    R: RegistrationRepository,
{
    async fn register(&self, request: RegisterRequest) -> Result<RegistrationOutcome, Error> {
        let team_name = match request.team_name {
            Some(name) => TeamNameChoice::Explicit(name),
            None => TeamNameChoice::Generated {
                base: request.user.default_team_name(),
            },
        };
        let draft = RegistrationDraft {
            user_id: request.user.user_id,
            event_id: request.event_id,
            team_name,
            accommodation_id: request.accommodation_id,
            food_preference: request.food_preference,
            now: self.clock.utc(),
        };

        let mut attempt = 1;
        let outcome = loop {
            match self.repo.register(&draft).await {
                Ok(outcome) => break outcome,
                Err(RegistrationRepositoryError::NameCollision { name })
                    if attempt < NAME_COLLISION_ATTEMPTS =>
                {
                    debug!(attempt, %name, "generated team name collided; retrying");
                    attempt += 1;
                }
                Err(err) => return Err(map_registration_error(err)),
            }
        };

        info!(
            registration_id = %outcome.registration_id,
            event_id = %outcome.event_id,
            resumed = outcome.resumed,
            "registration accepted"
        );
        if outcome.confirmed_on_insert() {
            self.dispatcher.dispatch(vec![registration_notice(&request.user, &outcome)]);
        }
        Ok(outcome)
    }
}

#[async_trait]
impl<R> RegistrationQuery for RegistrationService<R>
where
    R: RegistrationRepository,
{
    async fn status(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<RegistrationStatus, Error> {
        self.repo
            .status(user_id, event_id)
            .await
            .map_err(map_registration_error)
    }

    async fn accommodations(&self) -> Result<Vec<Accommodation>, Error> {
        self.repo
            .accommodations()
            .await
            .map_err(map_registration_error)
    }
}

/// Team join engine implementing [`TeamJoinCommand`].
#[derive(Clone)]
pub struct TeamJoinService<R> {
    repo: Arc<R>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
}

impl<R> TeamJoinService<R> {
    /// Create a new service.
    pub fn new(repo: Arc<R>, dispatcher: NotificationDispatcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            dispatcher,
            clock,
        }
    }
}

fn join_notice(user: &Identity, outcome: &JoinOutcome) -> RegistrationNotice {
    RegistrationNotice {
        recipient_name: user.name.clone(),
        recipient_email: user.email.clone(),
        event_name: outcome.event_name.clone(),
        shape: EventShape::Team {
            min_members: outcome.team.min_members,
            max_members: outcome.team.max_members,
        },
        fee: outcome.fee,
        team: Some(NoticeTeam {
            name: outcome.team.name.clone(),
            code: outcome.team.code.to_string(),
            is_lead: false,
        }),
        accommodation: outcome
            .accommodation
            .as_ref()
            .map(|accommodation| accommodation.name.clone()),
        food_preference: outcome.food_preference.to_string(),
    }
}

#[async_trait]
impl<R> TeamJoinCommand for TeamJoinService<R>
where
    R: RegistrationRepository,
{
    async fn join_team(&self, request: JoinTeamRequest) -> Result<JoinOutcome, Error> {
        let team_code = TeamCode::parse(&request.team_code).map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(serde_json::json!({ "field": "teamCode" }))
        })?;
        let draft = JoinDraft {
            user_id: request.user.user_id,
            event_id: request.event_id,
            team_code,
            accommodation_id: request.accommodation_id,
            food_preference: request.food_preference,
            now: self.clock.utc(),
        };

        let outcome = self
            .repo
            .join_team(&draft)
            .await
            .map_err(map_registration_error)?;

        info!(
            registration_id = %outcome.registration_id,
            team_id = %outcome.team.id,
            members = outcome.team.current_members,
            "team joined"
        );
        self.dispatcher
            .dispatch(vec![join_notice(&request.user, &outcome)]);
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "registration_service_tests.rs"]
mod tests;
