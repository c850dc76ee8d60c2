//! Bearer authentication for HTTP handlers.
//!
//! Handlers take an [`AuthenticatedUser`] argument; the extractor reads the
//! `Authorization` header, resolves it through the identity port held in
//! [`HttpState`], and rejects the request before the handler runs.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::ports::IdentityError;
use crate::domain::{BearerCredential, Error, Identity};
use crate::inbound::http::state::HttpState;

/// Caller identity resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(Identity);

impl AuthenticatedUser {
    /// Resolved identity.
    pub fn identity(&self) -> &Identity {
        &self.0
    }

    /// Take ownership of the identity.
    pub fn into_identity(self) -> Identity {
        self.0
    }
}

fn missing_credentials() -> Error {
    Error::unauthorized("Missing or invalid authorization header")
        .with_details(json!({ "requiresLogin": true }))
}

fn map_identity_error(error: IdentityError) -> Error {
    match error {
        IdentityError::InvalidToken { .. } | IdentityError::UnknownUser { .. } => {
            debug!(%error, "bearer token rejected");
            Error::unauthorized("Invalid or expired access token")
                .with_details(json!({ "requiresLogin": true }))
        }
        IdentityError::Unavailable { .. } => {
            warn!(%error, "identity lookup failed");
            Error::service_unavailable("Authentication is temporarily unavailable")
        }
    }
}

fn credential_from(req: &HttpRequest) -> Option<BearerCredential> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()
        .and_then(BearerCredential::from_authorization_header)
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let credential = credential_from(req);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let credential = credential.ok_or_else(missing_credentials)?;
            state
                .identity
                .resolve(&credential)
                .await
                .map(AuthenticatedUser)
                .map_err(map_identity_error)
        })
    }
}
