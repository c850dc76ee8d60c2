//! Portal user identity.
//!
//! Users are created and authenticated elsewhere; this crate only consumes a
//! resolved [`Identity`] for the caller of each operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::TEAM_NAME_MAX;
use super::identifier::define_numeric_id;

define_numeric_id! {
    /// Stable user identifier (`users.user_id`).
    pub struct UserId(i64);
}

/// Role assigned to a portal account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular participant.
    Student,
    /// Event administrator.
    Admin,
    /// Super administrator.
    Master,
}

impl UserRole {
    /// Database representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
            Self::Master => "master",
        }
    }

    /// Whether the role may operate check-in desks.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Master)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown user role: {0}")]
pub struct UnknownRoleError(pub String);

impl FromStr for UserRole {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "admin" => Ok(Self::Admin),
            "master" => Ok(Self::Master),
            other => Err(UnknownRoleError(other.to_owned())),
        }
    }
}

/// Resolved identity of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Account identifier.
    pub user_id: UserId,
    /// Display name shown on registrations and used to derive team names.
    pub name: String,
    /// Address used for confirmation notifications.
    pub email: String,
    /// Account role.
    pub role: UserRole,
}

impl Identity {
    /// Default team name offered when a team lead does not supply one.
    ///
    /// # Examples
    /// ```
    /// use portal_backend::domain::{Identity, UserId, UserRole};
    ///
    /// let lead = Identity {
    ///     user_id: UserId::new(1),
    ///     name: "Noah".to_owned(),
    ///     email: "noah@example.com".to_owned(),
    ///     role: UserRole::Student,
    /// };
    /// assert_eq!(lead.default_team_name(), "Noah's Team");
    /// ```
    ///
    /// Only the first [`TEAM_NAME_MAX`] characters of the display name are
    /// used, so the name plus any ` (N)` suffix fits the `teams` column.
    #[must_use]
    pub fn default_team_name(&self) -> String {
        let clamped: String = self.name.trim().chars().take(TEAM_NAME_MAX).collect();
        match clamped.trim_end() {
            "" => "Team".to_owned(),
            name => format!("{name}'s Team"),
        }
    }
}

/// Opaque bearer token presented by a client.
///
/// The token is zeroed on drop and never printed.
#[derive(Clone)]
pub struct BearerCredential(Zeroizing<String>);

impl BearerCredential {
    /// Extract the token from an `Authorization` header value.
    ///
    /// Returns `None` unless the value uses the `Bearer` scheme with a
    /// non-empty token.
    ///
    /// # Examples
    /// ```
    /// use portal_backend::domain::BearerCredential;
    ///
    /// assert!(BearerCredential::from_authorization_header("Bearer abc").is_some());
    /// assert!(BearerCredential::from_authorization_header("Basic abc").is_none());
    /// ```
    #[must_use]
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let token = value.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self(Zeroizing::new(token.to_owned())))
    }

    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Access the token for verification.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerCredential(<redacted>)")
    }
}
