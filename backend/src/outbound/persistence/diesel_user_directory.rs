//! PostgreSQL-backed `UserDirectory` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{Identity, UserId};

use super::diesel_helpers::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserDirectory` port.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    /// Create a new directory with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: &PoolError) -> UserDirectoryError {
    UserDirectoryError::connection(pool_error_message(error))
}

fn map_diesel_error(error: &diesel::result::Error) -> UserDirectoryError {
    match classify_diesel_error(error) {
        DieselFailure::Connection => UserDirectoryError::connection("database connection error"),
        _ => UserDirectoryError::query("database error"),
    }
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn find_identity(
        &self,
        user_id: UserId,
    ) -> Result<Option<Identity>, UserDirectoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_pool_error(&err))?;
        let row: Option<UserRow> = users::table
            .find(user_id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        row.map(Identity::try_from)
            .transpose()
            .map_err(UserDirectoryError::query)
    }
}
