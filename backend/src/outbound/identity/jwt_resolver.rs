//! HS256 access-token resolver backed by the user directory.
//!
//! Tokens are issued by the portal's login service and carry the numeric
//! user id plus an expiry. Only the signature and `exp` are validated; the
//! account itself is re-read on every request so deleted users lose access
//! immediately.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{IdentityError, IdentityResolver, UserDirectory};
use crate::domain::{BearerCredential, Identity, UserId};

/// Claims carried by a portal access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Authenticated user id.
    pub user_id: i64,
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
}

/// Resolves HS256-signed access tokens to identities.
pub struct JwtIdentityResolver {
    decoding_key: DecodingKey,
    validation: Validation,
    directory: Arc<dyn UserDirectory>,
}

impl JwtIdentityResolver {
    /// Build a resolver verifying tokens with `secret`.
    pub fn new(secret: &Zeroizing<String>, directory: Arc<dyn UserDirectory>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            directory,
        }
    }

    fn claims(&self, token: &str) -> Result<AccessClaims, IdentityError> {
        decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!(error = %err, "access token rejected");
                match err.kind() {
                    ErrorKind::ExpiredSignature => IdentityError::invalid_token("token expired"),
                    _ => IdentityError::invalid_token("token could not be verified"),
                }
            })
    }
}

#[async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, credential: &BearerCredential) -> Result<Identity, IdentityError> {
        let claims = self.claims(credential.expose())?;
        let user_id = UserId::new(claims.user_id);
        self.directory
            .find_identity(user_id)
            .await
            .map_err(|err| IdentityError::unavailable(err.to_string()))?
            .ok_or_else(|| IdentityError::unknown_user(user_id.to_string()))
    }
}
