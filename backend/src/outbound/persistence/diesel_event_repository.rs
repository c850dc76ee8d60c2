//! PostgreSQL-backed `EventRepository` implementation using Diesel ORM.
//!
//! Listing reads run in one read-only repeatable-read transaction so every
//! capacity count is taken from the same snapshot as the event rows.

use async_trait::async_trait;
use diesel::expression_methods::PgSortExpressionMethods;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{EventRepository, EventRepositoryError};
use crate::domain::{EventId, EventListing};

use super::diesel_helpers::{DieselFailure, TxError, classify_diesel_error, pool_error_message};
use super::engine_queries::paid_units;
use super::models::EventListingRow;
use super::pool::{DbPool, PoolError};
use super::schema::events;

/// Diesel-backed implementation of the `EventRepository` port.
#[derive(Clone)]
pub struct DieselEventRepository {
    pool: DbPool,
}

impl DieselEventRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: &PoolError) -> EventRepositoryError {
    EventRepositoryError::connection(pool_error_message(error))
}

fn map_tx_error(error: TxError) -> EventRepositoryError {
    match error {
        TxError::Diesel(diesel_error) => match classify_diesel_error(&diesel_error) {
            DieselFailure::Connection => {
                EventRepositoryError::connection("database connection error")
            }
            DieselFailure::Contention
            | DieselFailure::UniqueViolation { .. }
            | DieselFailure::Query => EventRepositoryError::query("database error"),
        },
        TxError::Rejected(rejection) => EventRepositoryError::query(rejection.to_string()),
        TxError::Gateway(gateway) => EventRepositoryError::query(gateway.to_string()),
        TxError::Internal(message) => EventRepositoryError::query(message),
    }
}

/// Convert a row and count its taken capacity. Events whose team bounds do
/// not classify cannot take registrations and report zero.
async fn with_taken_units(
    conn: &mut AsyncPgConnection,
    row: EventListingRow,
) -> Result<EventListing, TxError> {
    let mut listing = EventListing::try_from(row).map_err(TxError::Internal)?;
    if let Ok(shape) = listing.event.shape() {
        listing.registrations_count = paid_units(conn, listing.event.id, shape).await?;
    }
    Ok(listing)
}

async fn list_in_tx(conn: &mut AsyncPgConnection) -> Result<Vec<EventListing>, TxError> {
    let rows: Vec<EventListingRow> = events::table
        .select(EventListingRow::as_select())
        .order((
            events::event_start_time.asc().nulls_last(),
            events::event_id.asc(),
        ))
        .load(conn)
        .await?;
    let mut listings = Vec::with_capacity(rows.len());
    for row in rows {
        listings.push(with_taken_units(conn, row).await?);
    }
    Ok(listings)
}

async fn find_in_tx(
    conn: &mut AsyncPgConnection,
    event_id: EventId,
) -> Result<Option<EventListing>, TxError> {
    let row: Option<EventListingRow> = events::table
        .find(event_id.get())
        .select(EventListingRow::as_select())
        .first(conn)
        .await
        .optional()?;
    match row {
        Some(row) => Ok(Some(with_taken_units(conn, row).await?)),
        None => Ok(None),
    }
}

#[async_trait]
impl EventRepository for DieselEventRepository {
    async fn list_events(&self) -> Result<Vec<EventListing>, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| list_in_tx(conn).scope_boxed())
            .await
            .map_err(map_tx_error)
    }

    async fn find_event(
        &self,
        event_id: EventId,
    ) -> Result<Option<EventListing>, EventRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        conn.build_transaction()
            .read_only()
            .repeatable_read()
            .run(|conn| find_in_tx(conn, event_id).scope_boxed())
            .await
            .map_err(map_tx_error)
    }
}

#[cfg(test)]
mod tests {
    //! Error mapping coverage; queries are exercised against embedded
    //! PostgreSQL in `tests/diesel_event_repository.rs`.
    use super::super::diesel_helpers::test_errors::database_error;
    use super::*;
    use diesel::result::DatabaseErrorKind;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(&PoolError::checkout("timed out"));
        assert_eq!(error, EventRepositoryError::connection("timed out"));
    }

    #[rstest]
    #[case::closed(
        TxError::Diesel(database_error(DatabaseErrorKind::ClosedConnection, "closed", None)),
        EventRepositoryError::connection("database connection error")
    )]
    #[case::serialization(
        TxError::Diesel(database_error(
            DatabaseErrorKind::SerializationFailure,
            "could not serialize access",
            None
        )),
        EventRepositoryError::query("database error")
    )]
    #[case::bad_row(
        TxError::Internal("unknown event status: archived".to_owned()),
        EventRepositoryError::query("unknown event status: archived")
    )]
    fn transaction_errors_map_to_port_errors(
        #[case] error: TxError,
        #[case] expected: EventRepositoryError,
    ) {
        assert_eq!(map_tx_error(error), expected);
    }
}
