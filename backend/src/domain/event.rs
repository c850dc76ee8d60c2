//! Event definitions as seen by the registration engines.
//!
//! Events are created and edited by administration tooling; the engines only
//! read them, always under a row lock.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifier::define_numeric_id;
use super::{Money, RegistrationRejection};

define_numeric_id! {
    /// Stable event identifier (`events.event_id`).
    pub struct EventId(i64);
}

/// Publication state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Open for registration within its window.
    Active,
    /// Hidden from registration.
    Inactive,
}

impl EventStatus {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Error returned when parsing an unknown event status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event status: {0}")]
pub struct UnknownEventStatusError(pub String);

impl FromStr for EventStatus {
    type Err = UnknownEventStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(UnknownEventStatusError(other.to_owned())),
        }
    }
}

/// Registration shape derived from the team size bounds.
///
/// `max_team_size > 1` is the sole discriminator between solo and team
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventShape {
    /// One registrant per capacity unit.
    Solo,
    /// One team per capacity unit.
    Team {
        /// Smallest team the event accepts.
        min_members: u32,
        /// Largest team the event accepts.
        max_members: u32,
    },
}

impl EventShape {
    /// Label used in API payloads.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Team { .. } => "team",
        }
    }
}

impl fmt::Display for EventShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Event row as read by the engines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Identifier.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Lower team size bound as stored.
    pub min_team_size: i32,
    /// Upper team size bound as stored.
    pub max_team_size: i32,
    /// Start of the registration window; open when absent.
    pub registration_opens: Option<DateTime<Utc>>,
    /// End of the registration window; open when absent.
    pub registration_closes: Option<DateTime<Utc>>,
    /// Fee charged per capacity unit.
    pub fee: Money,
    /// Optional cap on paid capacity units.
    pub max_registrations: Option<i32>,
    /// Publication state.
    pub status: EventStatus,
}

impl Event {
    /// Validate the team size bounds and classify the event.
    ///
    /// # Examples
    /// ```
    /// use portal_backend::domain::{Event, EventId, EventShape, EventStatus, Money};
    ///
    /// let event = Event {
    ///     id: EventId::new(1),
    ///     name: "Hackathon".to_owned(),
    ///     min_team_size: 2,
    ///     max_team_size: 4,
    ///     registration_opens: None,
    ///     registration_closes: None,
    ///     fee: Money::ZERO,
    ///     max_registrations: None,
    ///     status: EventStatus::Active,
    /// };
    /// assert_eq!(
    ///     event.shape(),
    ///     Ok(EventShape::Team { min_members: 2, max_members: 4 })
    /// );
    /// ```
    pub fn shape(&self) -> Result<EventShape, RegistrationRejection> {
        let min = u32::try_from(self.min_team_size)
            .map_err(|_| RegistrationRejection::InvalidEventConfiguration)?;
        let max = u32::try_from(self.max_team_size)
            .map_err(|_| RegistrationRejection::InvalidEventConfiguration)?;
        if min < 1 || max < 1 || min > max {
            return Err(RegistrationRejection::InvalidEventConfiguration);
        }
        if max == 1 {
            Ok(EventShape::Solo)
        } else {
            Ok(EventShape::Team {
                min_members: min,
                max_members: max,
            })
        }
    }

    /// Check the publication state and registration window at `now`.
    pub fn ensure_accepting(&self, now: DateTime<Utc>) -> Result<(), RegistrationRejection> {
        if self.status != EventStatus::Active {
            return Err(RegistrationRejection::EventInactive);
        }
        if self.registration_opens.is_some_and(|opens| now < opens) {
            return Err(RegistrationRejection::RegistrationNotStarted);
        }
        if self.registration_closes.is_some_and(|closes| now > closes) {
            return Err(RegistrationRejection::RegistrationClosed);
        }
        Ok(())
    }

    /// Whether registrants must pay before their capacity unit counts.
    #[must_use]
    pub const fn requires_payment(&self) -> bool {
        !self.fee.is_free()
    }
}
