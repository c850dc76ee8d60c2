//! PostgreSQL-backed `PaymentRepository` implementation using Diesel ORM.
//!
//! Initiation calls the payment gateway from inside the transaction, after
//! ownership and capacity checks, so a failed order leaves no payment row.
//! Completion locks the event, the registration, and the payment in that
//! order, then marks everything paid and materializes a deferred team.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{
    InitiatePayment, PaymentGateway, PaymentLookup, PaymentRepository, PaymentRepositoryError,
    PendingOrder,
};
use crate::domain::{
    AccommodationId, Event, EventId, EventShape, Money, NoticeTeam, OrderReference, OrderRequest,
    PayabilityFacts, PaymentActivation, PaymentDetails, PaymentOverview, PaymentStatus,
    RegistrationId, RegistrationNotice, RegistrationRejection, TeamSummary, UserId,
    VerifiedPayment, check_payable, next_available_name,
};

use super::diesel_helpers::{
    DieselFailure, TEAM_CODE_CONSTRAINT, TEAM_NAME_CONSTRAINT, TxError, apply_lock_timeout,
    classify_diesel_error, pool_error_message,
};
use super::engine_queries::{
    TeamSeed, check_capacity, load_accommodation, load_event, load_user, lock_event,
    materialize_team, summarize_team, taken_team_names, team_of_registration, team_roster,
};
use super::models::{NewPaymentRow, PaymentRow, RegistrationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{payments, registrations};

/// Diesel-backed implementation of the `PaymentRepository` port.
#[derive(Clone)]
pub struct DieselPaymentRepository {
    pool: DbPool,
    gateway: Arc<dyn PaymentGateway>,
}

impl DieselPaymentRepository {
    /// Create a new repository that opens orders through `gateway`.
    pub fn new(pool: DbPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, gateway }
    }
}

fn map_pool_error(error: &PoolError) -> PaymentRepositoryError {
    PaymentRepositoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: &diesel::result::Error) -> PaymentRepositoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection => {
            PaymentRepositoryError::connection("database connection error")
        }
        DieselFailure::Contention => PaymentRepositoryError::conflict(error.to_string()),
        failure @ DieselFailure::UniqueViolation { .. }
            if failure.is_unique(TEAM_NAME_CONSTRAINT) || failure.is_unique(TEAM_CODE_CONSTRAINT) =>
        {
            PaymentRepositoryError::conflict(error.to_string())
        }
        DieselFailure::UniqueViolation { .. } | DieselFailure::Query => {
            PaymentRepositoryError::query("database error")
        }
    }
}

fn map_tx_error(error: TxError) -> PaymentRepositoryError {
    match error {
        TxError::Diesel(diesel_error) => map_diesel_error(&diesel_error),
        TxError::Rejected(rejection) => rejection.into(),
        TxError::Gateway(gateway) => PaymentRepositoryError::gateway(gateway),
        TxError::Internal(message) => PaymentRepositoryError::query(message),
    }
}

async fn lock_registration(
    conn: &mut AsyncPgConnection,
    registration_id: RegistrationId,
) -> Result<RegistrationRow, TxError> {
    registrations::table
        .find(registration_id.get())
        .select(RegistrationRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?
        .ok_or(TxError::Rejected(RegistrationRejection::RegistrationNotFound))
}

async fn event_of_registration(
    conn: &mut AsyncPgConnection,
    registration_id: RegistrationId,
) -> Result<Option<EventId>, TxError> {
    let event_id: Option<i64> = registrations::table
        .find(registration_id.get())
        .select(registrations::event_id)
        .first(conn)
        .await
        .optional()?;
    Ok(event_id.map(EventId::new))
}

async fn initiate_in_tx(
    conn: &mut AsyncPgConnection,
    pool: &DbPool,
    gateway: &dyn PaymentGateway,
    request: InitiatePayment,
) -> Result<PendingOrder, TxError> {
    apply_lock_timeout(conn, pool).await?;
    let event_id = event_of_registration(conn, request.registration_id)
        .await?
        .ok_or(RegistrationRejection::RegistrationNotFound)?;
    let event = lock_event(conn, event_id).await?;
    let registration = lock_registration(conn, request.registration_id).await?;
    let team = team_of_registration(conn, registration.id()).await?;

    check_payable(
        &event,
        PayabilityFacts {
            owner: UserId::new(registration.student_id),
            payment_status: registration.payment_status,
            team_lead: team.as_ref().map(|row| UserId::new(row.team_lead_id)),
        },
        request.user_id,
    )?;
    let shape = event.shape()?;
    check_capacity(conn, &event, shape).await?;

    let payer = load_user(conn, request.user_id).await?;
    let order = gateway
        .create_order(&OrderRequest::for_registration(
            registration.id(),
            event.fee,
            event.name.as_str(),
            payer.name.as_str(),
        ))
        .await?;

    diesel::insert_into(payments::table)
        .values(&NewPaymentRow {
            registration_id: registration.registration_id,
            gateway_order_id: order.order_id.as_ref(),
            amount_minor: order.amount.minor_units(),
            currency: order.currency.as_str(),
            status: PaymentStatus::Pending.as_str(),
            created_at: request.now,
            updated_at: request.now,
        })
        .on_conflict(payments::registration_id)
        .do_update()
        .set((
            payments::gateway_order_id.eq(excluded(payments::gateway_order_id)),
            payments::gateway_payment_id.eq(None::<String>),
            payments::gateway_signature.eq(None::<String>),
            payments::amount_minor.eq(excluded(payments::amount_minor)),
            payments::currency.eq(excluded(payments::currency)),
            payments::status.eq(excluded(payments::status)),
            payments::updated_at.eq(excluded(payments::updated_at)),
        ))
        .execute(conn)
        .await?;

    Ok(PendingOrder {
        registration_id: registration.id(),
        order_id: order.order_id,
        amount: order.amount,
        currency: order.currency,
        event_name: event.name,
        user_name: payer.name,
        user_email: payer.email,
    })
}

/// Team for a lead who just paid: reuse a linked team or materialize the
/// reserved one.
async fn activate_team(
    conn: &mut AsyncPgConnection,
    event: &Event,
    shape: EventShape,
    registration: &RegistrationRow,
    now: DateTime<Utc>,
) -> Result<TeamSummary, TxError> {
    if let Some(existing) = team_of_registration(conn, registration.id()).await? {
        return summarize_team(conn, existing, shape).await;
    }
    let lead_id = UserId::new(registration.student_id);
    let name = match registration.pending_team_name.clone() {
        Some(name) => name,
        None => {
            let lead = load_user(conn, lead_id).await?;
            let taken = taken_team_names(conn, event.id).await?;
            next_available_name(&lead.default_team_name(), taken.iter().map(String::as_str))
        }
    };
    materialize_team(
        conn,
        TeamSeed {
            event_id: event.id,
            shape,
            name: &name,
            lead_id,
            lead_registration: registration.id(),
            now,
        },
    )
    .await
}

async fn solo_notice(
    conn: &mut AsyncPgConnection,
    event: &Event,
    shape: EventShape,
    registration: &RegistrationRow,
) -> Result<RegistrationNotice, TxError> {
    let owner = load_user(conn, UserId::new(registration.student_id)).await?;
    let accommodation = load_accommodation(
        conn,
        registration.accommodation_id.map(AccommodationId::new),
    )
    .await?;
    Ok(RegistrationNotice {
        recipient_name: owner.name,
        recipient_email: owner.email,
        event_name: event.name.clone(),
        shape,
        fee: event.fee,
        team: None,
        accommodation: accommodation.map(|found| found.name),
        food_preference: registration.food_preference.clone(),
    })
}

async fn team_notices(
    conn: &mut AsyncPgConnection,
    event: &Event,
    shape: EventShape,
    team: &TeamSummary,
) -> Result<Vec<RegistrationNotice>, TxError> {
    let roster = team_roster(conn, team.id).await?;
    Ok(roster
        .into_iter()
        .map(|member| RegistrationNotice {
            team: Some(NoticeTeam {
                name: team.name.clone(),
                code: team.code.to_string(),
                is_lead: member.user_id == team.lead_id,
            }),
            recipient_name: member.name,
            recipient_email: member.email,
            event_name: event.name.clone(),
            shape,
            fee: event.fee,
            accommodation: member.accommodation,
            food_preference: member.food_preference,
        })
        .collect())
}

async fn complete_in_tx(
    conn: &mut AsyncPgConnection,
    pool: &DbPool,
    proof: &VerifiedPayment,
    now: DateTime<Utc>,
) -> Result<PaymentActivation, TxError> {
    apply_lock_timeout(conn, pool).await?;
    let located: Option<(i64, i64, i64)> = payments::table
        .inner_join(registrations::table)
        .filter(payments::gateway_order_id.eq(proof.order().as_ref()))
        .select((
            payments::payment_id,
            registrations::registration_id,
            registrations::event_id,
        ))
        .first(conn)
        .await
        .optional()?;
    let (payment_id, registration_id, event_id) =
        located.ok_or(RegistrationRejection::PaymentNotFound)?;

    let event = lock_event(conn, EventId::new(event_id)).await?;
    let registration = lock_registration(conn, RegistrationId::new(registration_id)).await?;
    let payment: PaymentRow = payments::table
        .find(payment_id)
        .select(PaymentRow::as_select())
        .for_update()
        .first(conn)
        .await?;
    if payment.payment_status().map_err(TxError::Internal)? == PaymentStatus::Completed {
        return Err(RegistrationRejection::AlreadyVerified.into());
    }

    let shape = event.shape()?;
    if !registration.payment_status {
        check_capacity(conn, &event, shape).await?;
    }

    diesel::update(payments::table.find(payment_id))
        .set((
            payments::status.eq(PaymentStatus::Completed.as_str()),
            payments::gateway_payment_id.eq(proof.payment().as_ref()),
            payments::gateway_signature.eq(proof.signature().as_ref()),
            payments::updated_at.eq(now),
        ))
        .execute(conn)
        .await?;

    let team = match shape {
        EventShape::Solo => None,
        EventShape::Team { .. } => {
            Some(activate_team(conn, &event, shape, &registration, now).await?)
        }
    };
    diesel::update(registrations::table.find(registration_id))
        .set((
            registrations::payment_status.eq(true),
            registrations::pending_team_name.eq(None::<String>),
        ))
        .execute(conn)
        .await?;

    let notices = match team.as_ref() {
        Some(summary) => team_notices(conn, &event, shape, summary).await?,
        None => vec![solo_notice(conn, &event, shape, &registration).await?],
    };
    let amount = Money::from_minor(payment.amount_minor)
        .map_err(|err| TxError::Internal(err.to_string()))?;
    debug!(
        registration_id,
        payment_id,
        materialized = team.is_some(),
        "payment completed"
    );

    Ok(PaymentActivation {
        registration_id: registration.id(),
        event_name: event.name,
        amount,
        payment_id: proof.payment().clone(),
        team,
        notices,
    })
}

async fn read_overview(
    conn: &mut AsyncPgConnection,
    user_id: UserId,
    registration_id: RegistrationId,
) -> Result<Option<PaymentOverview>, TxError> {
    let registration: Option<RegistrationRow> = registrations::table
        .find(registration_id.get())
        .filter(registrations::student_id.eq(user_id.get()))
        .select(RegistrationRow::as_select())
        .first(conn)
        .await
        .optional()?;
    let Some(registration) = registration else {
        return Ok(None);
    };
    let event = load_event(conn, EventId::new(registration.event_id), false)
        .await?
        .ok_or_else(|| TxError::Internal(format!("missing event {}", registration.event_id)))?;
    let payment: Option<PaymentRow> = payments::table
        .filter(payments::registration_id.eq(registration_id.get()))
        .select(PaymentRow::as_select())
        .first(conn)
        .await
        .optional()?;
    let details = payment
        .map(PaymentDetails::try_from)
        .transpose()
        .map_err(TxError::Internal)?;

    Ok(Some(PaymentOverview {
        registration_id,
        event_name: event.name,
        fee: event.fee,
        payment_status: registration.payment_status,
        details,
    }))
}

#[async_trait]
impl PaymentRepository for DieselPaymentRepository {
    async fn initiate(
        &self,
        request: InitiatePayment,
    ) -> Result<PendingOrder, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        let pool = &self.pool;
        let gateway = self.gateway.as_ref();
        conn.build_transaction()
            .serializable()
            .run(|conn| initiate_in_tx(conn, pool, gateway, request).scope_boxed())
            .await
            .map_err(map_tx_error)
    }

    async fn find_by_order(
        &self,
        order: &OrderReference,
    ) -> Result<Option<PaymentLookup>, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        let row: Option<(i64, i64, String)> = payments::table
            .inner_join(registrations::table)
            .filter(payments::gateway_order_id.eq(order.as_ref()))
            .select((
                payments::registration_id,
                registrations::student_id,
                payments::status,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        let Some((registration_id, owner, status)) = row else {
            return Ok(None);
        };
        let status: PaymentStatus = status
            .parse()
            .map_err(|err| PaymentRepositoryError::query(format!("{err}")))?;
        Ok(Some(PaymentLookup {
            registration_id: RegistrationId::new(registration_id),
            owner: UserId::new(owner),
            status,
        }))
    }

    async fn complete(
        &self,
        proof: &VerifiedPayment,
        now: DateTime<Utc>,
    ) -> Result<PaymentActivation, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        let pool = &self.pool;
        conn.build_transaction()
            .serializable()
            .run(|conn| complete_in_tx(conn, pool, proof, now).scope_boxed())
            .await
            .map_err(map_tx_error)
    }

    async fn overview(
        &self,
        user_id: UserId,
        registration_id: RegistrationId,
    ) -> Result<Option<PaymentOverview>, PaymentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        read_overview(&mut conn, user_id, registration_id)
            .await
            .map_err(map_tx_error)
    }
}
