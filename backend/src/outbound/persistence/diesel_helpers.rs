//! Shared helpers for Diesel repository implementations.
//!
//! Repositories run their write paths inside serializable transactions and
//! return a [`TxError`] from the transaction body. After the transaction
//! settles, [`classify_diesel_error`] sorts database failures into the coarse
//! buckets each repository maps onto its own port error.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::RegistrationRejection;
use crate::domain::ports::PaymentGatewayError;

use super::pool::{DbPool, PoolError};

/// Unique index guarding case-insensitive team names per event.
pub(crate) const TEAM_NAME_CONSTRAINT: &str = "teams_event_name_lower_key";
/// Unique constraint guarding team codes per event.
pub(crate) const TEAM_CODE_CONSTRAINT: &str = "teams_event_code_key";
/// Unique constraint guarding one registration per student and event.
pub(crate) const REGISTRATION_CONSTRAINT: &str = "registrations_student_event_key";

/// Coarse classification of a Diesel failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// The connection dropped mid-operation.
    Connection,
    /// Serialization failure, deadlock, or lock timeout. Safe to retry.
    Contention,
    /// A unique constraint rejected the write.
    UniqueViolation {
        /// Constraint reported by PostgreSQL, when available.
        constraint: Option<String>,
    },
    /// Anything else.
    Query,
}

impl DieselFailure {
    /// Whether the failure was raised by the named unique constraint.
    pub(crate) fn is_unique(&self, name: &str) -> bool {
        matches!(self, Self::UniqueViolation { constraint: Some(c) } if c == name)
    }
}

fn is_contention_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("deadlock detected")
        || lower.contains("lock timeout")
        || lower.contains("could not obtain lock")
        || lower.contains("could not serialize access")
}

/// Classify a Diesel error and emit debug context.
pub(crate) fn classify_diesel_error(error: &DieselError) -> DieselFailure {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
            match kind {
                DatabaseErrorKind::ClosedConnection => DieselFailure::Connection,
                DatabaseErrorKind::SerializationFailure => DieselFailure::Contention,
                DatabaseErrorKind::UniqueViolation => DieselFailure::UniqueViolation {
                    constraint: info.constraint_name().map(str::to_owned),
                },
                _ if is_contention_message(info.message()) => DieselFailure::Contention,
                _ => DieselFailure::Query,
            }
        }
        other => {
            debug!(
                error_type = %std::any::type_name_of_val(other),
                error = %other,
                "diesel operation failed"
            );
            DieselFailure::Query
        }
    }
}

/// Extract a readable message from a pool error.
pub(crate) fn pool_error_message(error: &PoolError) -> String {
    error.message().to_owned()
}

/// Failure raised inside a repository transaction body.
///
/// Returning any variant rolls the transaction back.
#[derive(Debug)]
pub(crate) enum TxError {
    /// Database failure.
    Diesel(DieselError),
    /// Business rule rejected the operation.
    Rejected(RegistrationRejection),
    /// Payment gateway call failed.
    Gateway(PaymentGatewayError),
    /// A stored row failed to convert, or an adapter invariant broke.
    Internal(String),
}

impl From<DieselError> for TxError {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl From<RegistrationRejection> for TxError {
    fn from(rejection: RegistrationRejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<PaymentGatewayError> for TxError {
    fn from(error: PaymentGatewayError) -> Self {
        Self::Gateway(error)
    }
}

/// Bound lock waits for the rest of the current transaction.
pub(crate) async fn apply_lock_timeout(
    conn: &mut AsyncPgConnection,
    pool: &DbPool,
) -> Result<(), TxError> {
    diesel::sql_query(pool.lock_timeout_statement())
        .execute(conn)
        .await?;
    Ok(())
}

/// Collect row conversion results, keeping the first error.
pub(crate) fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}

/// Convert a non-negative count or size into `u32`, flagging corrupt rows.
pub(crate) fn to_u32(value: i64, column: &str) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("{column} out of range: {value}"))
}
