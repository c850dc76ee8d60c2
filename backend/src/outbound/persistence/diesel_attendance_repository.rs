//! PostgreSQL-backed `AttendanceRepository` implementation using Diesel ORM.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{AttendanceRepository, AttendanceRepositoryError};
use crate::domain::{
    AccommodationId, AttendanceRecord, AttendanceStatus, EventId, Identity, RegistrationId,
    RegistrationRejection, RegistrationReportEntry, ReportTeam,
};

use super::diesel_helpers::{
    DieselFailure, TxError, classify_diesel_error, pool_error_message,
};
use super::engine_queries::{load_accommodation, team_of_registration};
use super::models::{RegistrationRow, TeamRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{events, registrations, team_registrations, teams, users};

/// Diesel-backed implementation of the `AttendanceRepository` port.
#[derive(Clone)]
pub struct DieselAttendanceRepository {
    pool: DbPool,
}

impl DieselAttendanceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: &PoolError) -> AttendanceRepositoryError {
    AttendanceRepositoryError::connection(pool_error_message(error))
}

fn map_tx_error(error: TxError) -> AttendanceRepositoryError {
    match error {
        TxError::Diesel(diesel_error) => match classify_diesel_error(&diesel_error) {
            DieselFailure::Connection => {
                AttendanceRepositoryError::connection("database connection error")
            }
            DieselFailure::Contention
            | DieselFailure::UniqueViolation { .. }
            | DieselFailure::Query => AttendanceRepositoryError::query("database error"),
        },
        TxError::Rejected(rejection) => AttendanceRepositoryError::rejected(rejection),
        TxError::Gateway(gateway) => AttendanceRepositoryError::query(gateway.to_string()),
        TxError::Internal(message) => AttendanceRepositoryError::query(message),
    }
}

async fn load_record(
    conn: &mut AsyncPgConnection,
    registration_id: RegistrationId,
    lock: bool,
) -> Result<Option<(RegistrationRow, AttendanceRecord)>, TxError> {
    if lock {
        let locked: Option<i64> = registrations::table
            .find(registration_id.get())
            .select(registrations::registration_id)
            .for_update()
            .first(conn)
            .await
            .optional()?;
        if locked.is_none() {
            return Ok(None);
        }
    }
    let row: Option<(RegistrationRow, String, String, String)> = registrations::table
        .inner_join(users::table)
        .inner_join(events::table)
        .filter(registrations::registration_id.eq(registration_id.get()))
        .select((
            RegistrationRow::as_select(),
            users::name,
            users::email,
            events::event_name,
        ))
        .first(conn)
        .await
        .optional()?;
    let Some((registration, name, email, event_name)) = row else {
        return Ok(None);
    };

    let team_name = team_of_registration(conn, registration.id())
        .await?
        .map(|team| team.team_name);
    let accommodation = load_accommodation(
        conn,
        registration.accommodation_id.map(AccommodationId::new),
    )
    .await?;
    let record = AttendanceRecord {
        registration_id: registration.id(),
        name,
        email,
        event_name,
        team_name,
        food_preference: registration.food_preference.clone(),
        accommodation,
        attendance_status: registration.attendance().map_err(TxError::Internal)?,
        payment_status: registration.payment_status,
    };
    Ok(Some((registration, record)))
}

async fn mark_present_in_tx(
    conn: &mut AsyncPgConnection,
    registration_id: RegistrationId,
) -> Result<AttendanceRecord, TxError> {
    let (registration, record) = load_record(conn, registration_id, true)
        .await?
        .ok_or(RegistrationRejection::RegistrationNotFound)?;
    if !registration.payment_status {
        return Err(RegistrationRejection::NotPaid.into());
    }
    diesel::update(registrations::table.find(registration.registration_id))
        .set(registrations::attendance_status.eq(AttendanceStatus::Present.as_str()))
        .execute(conn)
        .await?;
    Ok(AttendanceRecord {
        attendance_status: AttendanceStatus::Present,
        ..record
    })
}

/// Teams of the given registrations, keyed by registration id.
async fn report_teams(
    conn: &mut AsyncPgConnection,
    registration_ids: Vec<i64>,
) -> Result<HashMap<i64, ReportTeam>, TxError> {
    if registration_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, TeamRow, String, String)> = team_registrations::table
        .inner_join(teams::table.inner_join(users::table))
        .filter(team_registrations::registration_id.eq_any(registration_ids))
        .select((
            team_registrations::registration_id,
            TeamRow::as_select(),
            users::name,
            users::email,
        ))
        .load(conn)
        .await?;
    rows.into_iter()
        .map(|(registration_id, team, lead_name, lead_email)| {
            let code = team.code().map_err(TxError::Internal)?;
            let entry = ReportTeam {
                team_id: team.id(),
                code,
                name: team.team_name,
                lead_name,
                lead_email,
            };
            Ok((registration_id, entry))
        })
        .collect()
}

async fn report_in_tx(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<RegistrationReportEntry>, TxError> {
    let rows: Vec<(RegistrationRow, UserRow, String)> = registrations::table
        .inner_join(users::table)
        .inner_join(events::table)
        .select((
            RegistrationRow::as_select(),
            UserRow::as_select(),
            events::event_name,
        ))
        .order((
            registrations::registered_at.desc(),
            registrations::registration_id.desc(),
        ))
        .load(conn)
        .await?;
    let ids = rows
        .iter()
        .map(|(registration, ..)| registration.registration_id)
        .collect();
    let mut teams_by_registration = report_teams(conn, ids).await?;

    rows.into_iter()
        .map(|(registration, user, event_name)| {
            let student = Identity::try_from(user).map_err(TxError::Internal)?;
            Ok(RegistrationReportEntry {
                registration_id: registration.id(),
                registered_at: registration.registered_at,
                event_id: EventId::new(registration.event_id),
                event_name,
                student_id: student.user_id,
                student_name: student.name,
                student_email: student.email,
                student_role: student.role,
                attendance_status: registration.attendance().map_err(TxError::Internal)?,
                payment_status: registration.payment_status,
                team: teams_by_registration.remove(&registration.registration_id),
                food_preference: registration.food_preference,
            })
        })
        .collect()
}

#[async_trait]
impl AttendanceRepository for DieselAttendanceRepository {
    async fn find(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Option<AttendanceRecord>, AttendanceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        let found = load_record(&mut conn, registration_id, false)
            .await
            .map_err(map_tx_error)?;
        Ok(found.map(|(_, record)| record))
    }

    async fn mark_present(
        &self,
        registration_id: RegistrationId,
    ) -> Result<AttendanceRecord, AttendanceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        conn.transaction(|conn| mark_present_in_tx(conn, registration_id).scope_boxed())
            .await
            .map_err(map_tx_error)
    }

    async fn registration_report(
        &self,
    ) -> Result<Vec<RegistrationReportEntry>, AttendanceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| report_in_tx(conn).scope_boxed())
            .await
            .map_err(map_tx_error)
    }
}
