//! Port for looking up registered users.

use async_trait::async_trait;

use crate::domain::{Identity, UserId, UserRole};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } => "user directory connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } => "user directory query failed: {message}",
    }
}

/// Resolve user ids to identities.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch the identity for `user_id`, if the account exists.
    async fn find_identity(&self, user_id: UserId)
    -> Result<Option<Identity>, UserDirectoryError>;
}

/// Fixture directory that knows every id as a student named after it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserDirectory;

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn find_identity(
        &self,
        user_id: UserId,
    ) -> Result<Option<Identity>, UserDirectoryError> {
        Ok(Some(Identity {
            user_id,
            name: format!("Student {user_id}"),
            email: format!("student{user_id}@example.edu"),
            role: UserRole::Student,
        }))
    }
}
