//! Port mapping bearer credentials to identities.

use async_trait::async_trait;

use crate::domain::{BearerCredential, Identity};

use super::{UserDirectory, define_port_error};
use super::FixtureUserDirectory;

define_port_error! {
    /// Errors raised while resolving a credential.
    pub enum IdentityError {
        /// Token is malformed, expired, or signed with another key.
        InvalidToken { message: String } => "invalid access token: {message}",
        /// Token names an account that no longer exists.
        UnknownUser { message: String } => "unknown user: {message}",
        /// Backing store could not be reached.
        Unavailable { message: String } => "identity lookup unavailable: {message}",
    }
}

/// Resolve a presented credential to an identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve `credential` or explain why it is not acceptable.
    async fn resolve(&self, credential: &BearerCredential) -> Result<Identity, IdentityError>;
}

/// Fixture resolver that treats the token as a numeric user id.
///
/// Used when no signing secret is configured so the API can be explored
/// locally with `Authorization: Bearer 1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityResolver;

#[async_trait]
impl IdentityResolver for FixtureIdentityResolver {
    async fn resolve(&self, credential: &BearerCredential) -> Result<Identity, IdentityError> {
        let user_id = credential
            .expose()
            .parse()
            .map_err(|_| IdentityError::invalid_token("fixture tokens are numeric user ids"))?;
        FixtureUserDirectory
            .find_identity(user_id)
            .await
            .map_err(|err| IdentityError::unavailable(err.to_string()))?
            .ok_or_else(|| IdentityError::unknown_user(user_id.to_string()))
    }
}
