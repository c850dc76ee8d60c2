//! PostgreSQL-backed `RegistrationRepository` implementation using Diesel ORM.
//!
//! Register and join each run in one serializable transaction. The event row
//! is locked first, then the caller's existing registration (register) or the
//! team row (join), so concurrent attempts against the same event serialize
//! on the same lock order. Capacity, window, and duplicate checks are
//! delegated to [`crate::domain::registration_rules`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{
    JoinDraft, RegistrationDraft, RegistrationRepository, RegistrationRepositoryError,
};
use crate::domain::{
    Accommodation, AccommodationId, ActivationState, Admission, AttendanceStatus, Event, EventId,
    EventShape, ExistingRegistration, FoodPreference, JoinOutcome, RegistrationOutcome,
    RegistrationRejection, RegistrationSnapshot, RegistrationStatus, TeamAssignment, TeamMember,
    TeamNameChoice, TeamSummary, UserId, admit_event, admit_join, resolve_existing,
};

use super::diesel_helpers::{
    DieselFailure, REGISTRATION_CONSTRAINT, TEAM_CODE_CONSTRAINT, TEAM_NAME_CONSTRAINT, TxError,
    apply_lock_timeout, classify_diesel_error, pool_error_message,
};
use super::engine_queries::{
    RosterEntry, TeamSeed, check_capacity, load_accommodation, load_event, load_user, lock_event,
    lock_team_by_code, materialize_team, summarize_team, taken_team_names, team_of_registration,
    team_roster,
};
use super::models::{
    AccommodationRow, NewRegistrationRow, NewTeamRegistrationRow, RegistrationRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{accommodations, registrations, team_registrations};

/// Diesel-backed implementation of the `RegistrationRepository` port.
#[derive(Clone)]
pub struct DieselRegistrationRepository {
    pool: DbPool,
}

impl DieselRegistrationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: &PoolError) -> RegistrationRepositoryError {
    RegistrationRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: &diesel::result::Error) -> RegistrationRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection => {
            RegistrationRepositoryError::connection("database connection error")
        }
        DieselFailure::Contention => RegistrationRepositoryError::conflict(error.to_string()),
        failure @ DieselFailure::UniqueViolation { .. }
            if failure.is_unique(REGISTRATION_CONSTRAINT)
                || failure.is_unique(TEAM_CODE_CONSTRAINT) =>
        {
            RegistrationRepositoryError::conflict(error.to_string())
        }
        DieselFailure::UniqueViolation { .. } | DieselFailure::Query => {
            RegistrationRepositoryError::query("database error")
        }
    }
}

/// Map a register transaction failure, taking the name strategy into
/// account: a lost race on an explicit name is a rejection, on a generated
/// name it is worth another attempt.
fn map_register_error(error: TxError, choice: &TeamNameChoice) -> RegistrationRepositoryError {
    if let TxError::Diesel(ref diesel_error) = error {
        if classify_diesel_error(diesel_error).is_unique(TEAM_NAME_CONSTRAINT) {
            return match choice {
                TeamNameChoice::Explicit(_) => RegistrationRejection::TeamNameTaken.into(),
                TeamNameChoice::Generated { base } => {
                    RegistrationRepositoryError::name_collision(base.as_str())
                }
            };
        }
    }
    map_tx_error(error)
}

fn map_tx_error(error: TxError) -> RegistrationRepositoryError {
    match error {
        TxError::Diesel(diesel_error) => map_diesel_error(&diesel_error),
        TxError::Rejected(rejection) => rejection.into(),
        TxError::Gateway(gateway) => RegistrationRepositoryError::query(gateway.to_string()),
        TxError::Internal(message) => RegistrationRepositoryError::query(message),
    }
}

async fn lock_existing(
    conn: &mut AsyncPgConnection,
    user_id: UserId,
    event_id: EventId,
) -> Result<Option<RegistrationRow>, TxError> {
    let row = registrations::table
        .filter(registrations::student_id.eq(user_id.get()))
        .filter(registrations::event_id.eq(event_id.get()))
        .select(RegistrationRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    Ok(row)
}

async fn insert_registration(
    conn: &mut AsyncPgConnection,
    row: &NewRegistrationRow<'_>,
) -> Result<RegistrationRow, TxError> {
    let inserted = diesel::insert_into(registrations::table)
        .values(row)
        .returning(RegistrationRow::as_returning())
        .get_result(conn)
        .await?;
    Ok(inserted)
}

/// Rebuild the outcome of an earlier unpaid registration.
async fn resume(
    conn: &mut AsyncPgConnection,
    event: &Event,
    shape: EventShape,
    row: RegistrationRow,
) -> Result<RegistrationOutcome, TxError> {
    let accommodation =
        load_accommodation(conn, row.accommodation_id.map(AccommodationId::new)).await?;
    let team = match team_of_registration(conn, row.id()).await? {
        Some(team_row) => TeamAssignment::Active(summarize_team(conn, team_row, shape).await?),
        None => match row.pending_team_name.clone() {
            Some(name) => TeamAssignment::Pending { name },
            None => TeamAssignment::None,
        },
    };
    Ok(RegistrationOutcome {
        registration_id: row.id(),
        event_id: event.id,
        event_name: event.name.clone(),
        shape,
        fee: event.fee,
        payment_status: row.payment_status,
        registered_at: row.registered_at,
        accommodation,
        food_preference: FoodPreference::from_optional(Some(row.food_preference.as_str())),
        team,
        resumed: true,
    })
}

async fn register_in_tx(
    conn: &mut AsyncPgConnection,
    pool: &DbPool,
    draft: &RegistrationDraft,
) -> Result<RegistrationOutcome, TxError> {
    apply_lock_timeout(conn, pool).await?;
    let event = lock_event(conn, draft.event_id).await?;
    let shape = admit_event(&event, draft.now)?;

    let existing_row = lock_existing(conn, draft.user_id, draft.event_id).await?;
    let existing = match existing_row.as_ref() {
        Some(row) => Some(ExistingRegistration {
            id: row.id(),
            payment_status: row.payment_status,
            team_id: team_of_registration(conn, row.id()).await?.map(|team| team.id()),
            pending_team_name: row.pending_team_name.clone(),
        }),
        None => None,
    };
    if let (Admission::Resume(_), Some(row)) = (resolve_existing(existing.as_ref())?, existing_row)
    {
        debug!(registration_id = %row.id(), "resuming unpaid registration");
        return resume(conn, &event, shape, row).await;
    }

    check_capacity(conn, &event, shape).await?;
    let accommodation = load_accommodation(conn, draft.accommodation_id).await?;
    let free = !event.requires_payment();

    let team_name = match shape {
        EventShape::Solo => None,
        EventShape::Team { .. } => {
            let taken = taken_team_names(conn, event.id).await?;
            let name = draft
                .team_name
                .resolve(taken.iter().map(String::as_str))
                .ok_or(RegistrationRejection::TeamNameTaken)?;
            Some(name)
        }
    };

    let inserted = insert_registration(
        conn,
        &NewRegistrationRow {
            student_id: draft.user_id.get(),
            event_id: event.id.get(),
            payment_status: free,
            accommodation_id: draft.accommodation_id.map(|id| id.get()),
            food_preference: draft.food_preference.as_ref(),
            pending_team_name: team_name.as_deref().filter(|_| !free),
            registered_at: draft.now,
        },
    )
    .await?;

    let team = match team_name {
        None => TeamAssignment::None,
        Some(name) if free => {
            let summary = materialize_team(
                conn,
                TeamSeed {
                    event_id: event.id,
                    shape,
                    name: &name,
                    lead_id: draft.user_id,
                    lead_registration: inserted.id(),
                    now: draft.now,
                },
            )
            .await?;
            TeamAssignment::Active(summary)
        }
        Some(name) => TeamAssignment::Pending { name },
    };

    Ok(RegistrationOutcome {
        registration_id: inserted.id(),
        event_id: event.id,
        event_name: event.name,
        shape,
        fee: event.fee,
        payment_status: inserted.payment_status,
        registered_at: inserted.registered_at,
        accommodation,
        food_preference: draft.food_preference.clone(),
        team,
        resumed: false,
    })
}

async fn join_in_tx(
    conn: &mut AsyncPgConnection,
    pool: &DbPool,
    draft: &JoinDraft,
) -> Result<JoinOutcome, TxError> {
    apply_lock_timeout(conn, pool).await?;
    let event = load_event(conn, draft.event_id, true)
        .await?
        .ok_or(RegistrationRejection::TeamNotFound)?;
    let team_row = lock_team_by_code(conn, event.id, &draft.team_code)
        .await?
        .ok_or(RegistrationRejection::TeamNotFound)?;
    let shape = event.shape()?;
    let team = summarize_team(conn, team_row, shape).await?;

    let already_registered = lock_existing(conn, draft.user_id, event.id)
        .await?
        .is_some();
    admit_join(&event, &team, draft.user_id, already_registered, draft.now)?;
    let accommodation = load_accommodation(conn, draft.accommodation_id).await?;

    let inserted = insert_registration(
        conn,
        &NewRegistrationRow {
            student_id: draft.user_id.get(),
            event_id: event.id.get(),
            payment_status: true,
            accommodation_id: draft.accommodation_id.map(|id| id.get()),
            food_preference: draft.food_preference.as_ref(),
            pending_team_name: None,
            registered_at: draft.now,
        },
    )
    .await?;
    diesel::insert_into(team_registrations::table)
        .values(&NewTeamRegistrationRow {
            registration_id: inserted.id().get(),
            team_id: team.id.get(),
            joined_at: draft.now,
        })
        .execute(conn)
        .await?;

    let roster = team_roster(conn, team.id).await?;
    let lead = match roster.iter().find(|entry| entry.user_id == team.lead_id) {
        Some(entry) => entry.member(),
        None => {
            let identity = load_user(conn, team.lead_id).await?;
            TeamMember {
                user_id: identity.user_id,
                name: identity.name,
            }
        }
    };
    let current_members = u32::try_from(roster.len())
        .map_err(|_| TxError::Internal("team roster too large".to_owned()))?;

    Ok(JoinOutcome {
        registration_id: inserted.id(),
        event_id: event.id,
        event_name: event.name,
        fee: event.fee,
        registered_at: inserted.registered_at,
        team: TeamSummary {
            current_members,
            ..team
        },
        lead,
        members: roster.iter().map(RosterEntry::member).collect(),
        accommodation,
        food_preference: draft.food_preference.clone(),
    })
}

async fn read_status(
    conn: &mut AsyncPgConnection,
    user_id: UserId,
    event_id: EventId,
) -> Result<RegistrationStatus, TxError> {
    let row: Option<RegistrationRow> = registrations::table
        .filter(registrations::student_id.eq(user_id.get()))
        .filter(registrations::event_id.eq(event_id.get()))
        .select(RegistrationRow::as_select())
        .first(conn)
        .await
        .optional()?;
    let Some(row) = row else {
        return Ok(RegistrationStatus::NotRegistered);
    };
    let event = load_event(conn, event_id, false)
        .await?
        .ok_or_else(|| TxError::Internal(format!("missing event {event_id}")))?;
    let shape = event.shape()?;
    let team = match team_of_registration(conn, row.id()).await? {
        Some(team_row) => Some(summarize_team(conn, team_row, shape).await?),
        None => None,
    };
    let attendance_status: AttendanceStatus = row.attendance().map_err(TxError::Internal)?;
    let activation = ActivationState::from_columns(
        row.payment_status,
        team.as_ref().map(|summary| summary.id),
        row.pending_team_name.clone(),
    );

    Ok(RegistrationStatus::Registered(Box::new(RegistrationSnapshot {
        user_id,
        registration_id: row.id(),
        event_name: event.name,
        shape,
        registered_at: row.registered_at,
        payment_status: row.payment_status,
        attendance_status,
        fee: event.fee,
        activation,
        team,
    })))
}

#[async_trait]
impl RegistrationRepository for DieselRegistrationRepository {
    async fn register(
        &self,
        draft: &RegistrationDraft,
    ) -> Result<RegistrationOutcome, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        let pool = &self.pool;
        conn.build_transaction()
            .serializable()
            .run(|conn| register_in_tx(conn, pool, draft).scope_boxed())
            .await
            .map_err(|err| map_register_error(err, &draft.team_name))
    }

    async fn join_team(
        &self,
        draft: &JoinDraft,
    ) -> Result<JoinOutcome, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        let pool = &self.pool;
        conn.build_transaction()
            .serializable()
            .run(|conn| join_in_tx(conn, pool, draft).scope_boxed())
            .await
            .map_err(map_tx_error)
    }

    async fn status(
        &self,
        user_id: UserId,
        event_id: EventId,
    ) -> Result<RegistrationStatus, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        read_status(&mut conn, user_id, event_id)
            .await
            .map_err(map_tx_error)
    }

    async fn accommodations(&self) -> Result<Vec<Accommodation>, RegistrationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        let rows: Vec<AccommodationRow> = accommodations::table
            .select(AccommodationRow::as_select())
            .order(accommodations::accommodation.asc())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(rows.into_iter().map(Accommodation::from).collect())
    }
}
