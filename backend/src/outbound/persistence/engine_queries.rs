//! Row-level reads and writes shared by the registration and payment
//! repositories.
//!
//! Every function here runs on a connection that is already inside a
//! transaction; callers decide the isolation level and lock order.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::{
    Accommodation, AccommodationId, Event, EventId, EventShape, Identity, RegistrationId,
    RegistrationRejection, TEAM_CODE_ATTEMPTS, TeamCode, TeamId, TeamMember, TeamSummary, UserId,
    ensure_capacity,
};

use super::diesel_helpers::{TxError, to_u32};
use super::models::{
    AccommodationRow, EventRow, NewTeamRegistrationRow, NewTeamRow, TeamRow, UserRow,
};
use super::schema::{accommodations, events, registrations, team_registrations, teams, users};

/// Member of a team roster with their own registration choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RosterEntry {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub accommodation: Option<String>,
    pub food_preference: String,
}

impl RosterEntry {
    pub(crate) fn member(&self) -> TeamMember {
        TeamMember {
            user_id: self.user_id,
            name: self.name.clone(),
        }
    }
}

/// Read an event, optionally taking a row lock on it.
pub(crate) async fn load_event(
    conn: &mut AsyncPgConnection,
    event_id: EventId,
    lock: bool,
) -> Result<Option<Event>, TxError> {
    let query = events::table
        .find(event_id.get())
        .select(EventRow::as_select());
    let row: Option<EventRow> = if lock {
        query.for_update().first(conn).await.optional()?
    } else {
        query.first(conn).await.optional()?
    };
    row.map(Event::try_from)
        .transpose()
        .map_err(TxError::Internal)
}

/// Lock the event row, rejecting unknown events.
pub(crate) async fn lock_event(
    conn: &mut AsyncPgConnection,
    event_id: EventId,
) -> Result<Event, TxError> {
    load_event(conn, event_id, true)
        .await?
        .ok_or(TxError::Rejected(RegistrationRejection::EventNotFound))
}

/// Number of capacity units already paid for.
///
/// Solo events count paid registrations. Team events count teams whose lead
/// holds a paid registration.
pub(crate) async fn paid_units(
    conn: &mut AsyncPgConnection,
    event_id: EventId,
    shape: EventShape,
) -> Result<i64, TxError> {
    let count = match shape {
        EventShape::Solo => {
            registrations::table
                .filter(registrations::event_id.eq(event_id.get()))
                .filter(registrations::payment_status.eq(true))
                .count()
                .get_result(conn)
                .await?
        }
        EventShape::Team { .. } => {
            teams::table
                .inner_join(
                    registrations::table.on(registrations::student_id
                        .eq(teams::team_lead_id)
                        .and(registrations::event_id.eq(teams::event_id))),
                )
                .filter(teams::event_id.eq(event_id.get()))
                .filter(registrations::payment_status.eq(true))
                .count()
                .get_result(conn)
                .await?
        }
    };
    Ok(count)
}

/// Reject the operation when the event's paid capacity is exhausted.
pub(crate) async fn check_capacity(
    conn: &mut AsyncPgConnection,
    event: &Event,
    shape: EventShape,
) -> Result<(), TxError> {
    if event.max_registrations.is_none() {
        return Ok(());
    }
    let used = paid_units(conn, event.id, shape).await?;
    ensure_capacity(event, used)?;
    Ok(())
}

/// Team names already claimed in the event, materialized or reserved.
pub(crate) async fn taken_team_names(
    conn: &mut AsyncPgConnection,
    event_id: EventId,
) -> Result<Vec<String>, TxError> {
    let mut names: Vec<String> = teams::table
        .filter(teams::event_id.eq(event_id.get()))
        .select(teams::team_name)
        .load(conn)
        .await?;
    let reserved: Vec<Option<String>> = registrations::table
        .filter(registrations::event_id.eq(event_id.get()))
        .filter(registrations::pending_team_name.is_not_null())
        .select(registrations::pending_team_name)
        .load(conn)
        .await?;
    names.extend(reserved.into_iter().flatten());
    Ok(names)
}

/// Resolve an optional accommodation id, rejecting unknown ids.
pub(crate) async fn load_accommodation(
    conn: &mut AsyncPgConnection,
    id: Option<AccommodationId>,
) -> Result<Option<Accommodation>, TxError> {
    let Some(id) = id else {
        return Ok(None);
    };
    let row: Option<AccommodationRow> = accommodations::table
        .find(id.get())
        .select(AccommodationRow::as_select())
        .first(conn)
        .await
        .optional()?;
    row.map(|found| Some(Accommodation::from(found)))
        .ok_or(TxError::Rejected(RegistrationRejection::InvalidAccommodation))
}

/// Load an account by id.
pub(crate) async fn load_user(
    conn: &mut AsyncPgConnection,
    user_id: UserId,
) -> Result<Identity, TxError> {
    let row: UserRow = users::table
        .find(user_id.get())
        .select(UserRow::as_select())
        .first(conn)
        .await?;
    Identity::try_from(row).map_err(TxError::Internal)
}

const fn team_bounds(shape: EventShape) -> (u32, u32) {
    match shape {
        EventShape::Solo => (1, 1),
        EventShape::Team {
            min_members,
            max_members,
        } => (min_members, max_members),
    }
}

/// Build a summary for a team row, counting its current members.
pub(crate) async fn summarize_team(
    conn: &mut AsyncPgConnection,
    row: TeamRow,
    shape: EventShape,
) -> Result<TeamSummary, TxError> {
    let members: i64 = team_registrations::table
        .filter(team_registrations::team_id.eq(row.team_id))
        .count()
        .get_result(conn)
        .await?;
    let code = row.code().map_err(TxError::Internal)?;
    let (min_members, max_members) = team_bounds(shape);
    Ok(TeamSummary {
        id: row.id(),
        name: row.team_name,
        code,
        lead_id: UserId::new(row.team_lead_id),
        current_members: to_u32(members, "team members").map_err(TxError::Internal)?,
        min_members,
        max_members,
    })
}

/// Team linked to a registration, if any.
pub(crate) async fn team_of_registration(
    conn: &mut AsyncPgConnection,
    registration_id: RegistrationId,
) -> Result<Option<TeamRow>, TxError> {
    let row = team_registrations::table
        .inner_join(teams::table)
        .filter(team_registrations::registration_id.eq(registration_id.get()))
        .select(TeamRow::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(row)
}

/// Lock the team carrying `code` within the event.
pub(crate) async fn lock_team_by_code(
    conn: &mut AsyncPgConnection,
    event_id: EventId,
    code: &TeamCode,
) -> Result<Option<TeamRow>, TxError> {
    let row = teams::table
        .filter(teams::event_id.eq(event_id.get()))
        .filter(teams::team_code.eq(code.as_ref()))
        .select(TeamRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    Ok(row)
}

/// Team creation request for [`materialize_team`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct TeamSeed<'a> {
    pub event_id: EventId,
    pub shape: EventShape,
    pub name: &'a str,
    pub lead_id: UserId,
    pub lead_registration: RegistrationId,
    pub now: DateTime<Utc>,
}

/// Create a team with a fresh join code and link the lead's registration.
///
/// Codes already used in the event are skipped; a concurrent insert of the
/// same code still fails on the unique constraint and aborts the
/// transaction.
pub(crate) async fn materialize_team(
    conn: &mut AsyncPgConnection,
    seed: TeamSeed<'_>,
) -> Result<TeamSummary, TxError> {
    let (min_members, max_members) = team_bounds(seed.shape);
    for _ in 0..TEAM_CODE_ATTEMPTS {
        let code = TeamCode::random();
        let in_use: i64 = teams::table
            .filter(teams::event_id.eq(seed.event_id.get()))
            .filter(teams::team_code.eq(code.as_ref()))
            .count()
            .get_result(conn)
            .await?;
        if in_use > 0 {
            continue;
        }

        let team_id: i64 = diesel::insert_into(teams::table)
            .values(&NewTeamRow {
                event_id: seed.event_id.get(),
                team_name: seed.name,
                team_code: code.as_ref(),
                team_lead_id: seed.lead_id.get(),
                created_at: seed.now,
            })
            .returning(teams::team_id)
            .get_result(conn)
            .await?;
        diesel::insert_into(team_registrations::table)
            .values(&NewTeamRegistrationRow {
                registration_id: seed.lead_registration.get(),
                team_id,
                joined_at: seed.now,
            })
            .execute(conn)
            .await?;

        return Ok(TeamSummary {
            id: TeamId::new(team_id),
            name: seed.name.to_owned(),
            code,
            lead_id: seed.lead_id,
            current_members: 1,
            min_members,
            max_members,
        });
    }
    Err(TxError::Internal(format!(
        "no free team code after {TEAM_CODE_ATTEMPTS} attempts"
    )))
}

/// Members of a team in join order, with their own registration choices.
pub(crate) async fn team_roster(
    conn: &mut AsyncPgConnection,
    team_id: TeamId,
) -> Result<Vec<RosterEntry>, TxError> {
    let rows: Vec<(i64, String, String, Option<String>, String)> = team_registrations::table
        .inner_join(registrations::table.inner_join(users::table))
        .left_join(
            accommodations::table.on(registrations::accommodation_id
                .eq(accommodations::accommodation_id.nullable())),
        )
        .filter(team_registrations::team_id.eq(team_id.get()))
        .order((
            team_registrations::joined_at.asc(),
            team_registrations::registration_id.asc(),
        ))
        .select((
            users::user_id,
            users::name,
            users::email,
            accommodations::accommodation.nullable(),
            registrations::food_preference,
        ))
        .load(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(
            |(user_id, name, email, accommodation, food_preference)| RosterEntry {
                user_id: UserId::new(user_id),
                name,
                email,
                accommodation,
                food_preference,
            },
        )
        .collect())
}
