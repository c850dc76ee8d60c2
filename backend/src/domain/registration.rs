//! Registrations and the state they carry through payment activation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifier::define_numeric_id;
use super::{EventId, EventShape, Money, TeamId, TeamMember, TeamSummary, UserId};

define_numeric_id! {
    /// Stable registration identifier (`registrations.registration_id`).
    pub struct RegistrationId(i64);
}

define_numeric_id! {
    /// Accommodation option identifier.
    pub struct AccommodationId(i32);
}

/// Default food preference recorded when the caller gives none.
pub const DEFAULT_FOOD_PREFERENCE: &str = "No food";

/// Accommodation option offered to registrants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accommodation {
    /// Identifier.
    pub id: AccommodationId,
    /// Display label.
    pub name: String,
}

/// Free-text food preference, defaulting to [`DEFAULT_FOOD_PREFERENCE`].
///
/// # Examples
/// ```
/// use portal_backend::domain::FoodPreference;
///
/// assert_eq!(FoodPreference::from_optional(None).as_ref(), "No food");
/// assert_eq!(FoodPreference::from_optional(Some("  ")).as_ref(), "No food");
/// assert_eq!(FoodPreference::from_optional(Some(" Veg ")).as_ref(), "Veg");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoodPreference(String);

impl FoodPreference {
    /// Trim the supplied text and fall back to the default when blank.
    #[must_use]
    pub fn from_optional(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if !value.is_empty() => Self(value.to_owned()),
            _ => Self::default(),
        }
    }
}

impl Default for FoodPreference {
    fn default() -> Self {
        Self(DEFAULT_FOOD_PREFERENCE.to_owned())
    }
}

impl AsRef<str> for FoodPreference {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for FoodPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check-in state of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// Not yet checked in.
    #[default]
    Absent,
    /// Checked in at the venue.
    Present,
}

impl AttendanceStatus {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Present => "present",
        }
    }
}

/// Error returned when parsing an unknown attendance status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown attendance status: {0}")]
pub struct UnknownAttendanceStatusError(pub String);

impl FromStr for AttendanceStatus {
    type Err = UnknownAttendanceStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absent" => Ok(Self::Absent),
            "present" => Ok(Self::Present),
            other => Err(UnknownAttendanceStatusError(other.to_owned())),
        }
    }
}

/// Explicit payment/team state of a registration.
///
/// Storage keeps a nullable team link and a nullable pending name; this enum
/// is the single place where those columns are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationState {
    /// Unpaid and not on a team. Paid team registrations carry the name
    /// reserved for materialization.
    UnpaidNoTeam {
        /// Name the team will take once the lead pays.
        pending_team_name: Option<String>,
    },
    /// Unpaid but already linked to a team.
    UnpaidExistingTeam {
        /// Linked team.
        team_id: TeamId,
    },
    /// Paid and linked to an active team.
    PaidTeamActive {
        /// Linked team.
        team_id: TeamId,
    },
    /// Paid solo registration.
    PaidNoTeam,
}

impl ActivationState {
    /// Interpret the stored columns.
    ///
    /// # Examples
    /// ```
    /// use portal_backend::domain::{ActivationState, TeamId};
    ///
    /// let state = ActivationState::from_columns(true, Some(TeamId::new(4)), None);
    /// assert_eq!(state, ActivationState::PaidTeamActive { team_id: TeamId::new(4) });
    /// assert_eq!(state.label(), "paid_team_active");
    /// ```
    #[must_use]
    pub fn from_columns(
        payment_status: bool,
        team_id: Option<TeamId>,
        pending_team_name: Option<String>,
    ) -> Self {
        match (payment_status, team_id) {
            (false, None) => Self::UnpaidNoTeam { pending_team_name },
            (false, Some(team_id)) => Self::UnpaidExistingTeam { team_id },
            (true, Some(team_id)) => Self::PaidTeamActive { team_id },
            (true, None) => Self::PaidNoTeam,
        }
    }

    /// Stable label used in API payloads.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::UnpaidNoTeam { .. } => "unpaid_no_team",
            Self::UnpaidExistingTeam { .. } => "unpaid_existing_team",
            Self::PaidTeamActive { .. } => "paid_team_active",
            Self::PaidNoTeam => "paid_no_team",
        }
    }

    /// Whether the registration counts as paid.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::PaidTeamActive { .. } | Self::PaidNoTeam)
    }

    /// Linked team, if any.
    #[must_use]
    pub const fn team_id(&self) -> Option<TeamId> {
        match self {
            Self::UnpaidExistingTeam { team_id } | Self::PaidTeamActive { team_id } => {
                Some(*team_id)
            }
            Self::UnpaidNoTeam { .. } | Self::PaidNoTeam => None,
        }
    }

    /// Name reserved for a deferred team.
    #[must_use]
    pub fn pending_team_name(&self) -> Option<&str> {
        match self {
            Self::UnpaidNoTeam { pending_team_name } => pending_team_name.as_deref(),
            _ => None,
        }
    }
}

/// Locked existing registration row for a `(student, event)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRegistration {
    /// Identifier.
    pub id: RegistrationId,
    /// Whether the registration is paid.
    pub payment_status: bool,
    /// Linked team, if any.
    pub team_id: Option<TeamId>,
    /// Name reserved for a deferred team.
    pub pending_team_name: Option<String>,
}

impl ExistingRegistration {
    /// Interpret the row as an [`ActivationState`].
    #[must_use]
    pub fn activation(&self) -> ActivationState {
        ActivationState::from_columns(
            self.payment_status,
            self.team_id,
            self.pending_team_name.clone(),
        )
    }
}

/// Team facet of a registration outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamAssignment {
    /// Solo event.
    None,
    /// Paid team event awaiting the lead's payment.
    Pending {
        /// Reserved team name.
        name: String,
    },
    /// Materialized team.
    Active(TeamSummary),
}

impl TeamAssignment {
    /// Team name, whether reserved or materialized.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Pending { name } => Some(name),
            Self::Active(team) => Some(&team.name),
        }
    }

    /// Materialized team, if any.
    #[must_use]
    pub const fn active(&self) -> Option<&TeamSummary> {
        match self {
            Self::Active(team) => Some(team),
            Self::None | Self::Pending { .. } => None,
        }
    }
}

/// Result of a register call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    /// Created or resumed registration.
    pub registration_id: RegistrationId,
    /// Event registered for.
    pub event_id: EventId,
    /// Event display name.
    pub event_name: String,
    /// Solo or team shape of the event.
    pub shape: EventShape,
    /// Fee per capacity unit.
    pub fee: Money,
    /// Whether the registration is already paid.
    pub payment_status: bool,
    /// Insert time of the registration row.
    pub registered_at: DateTime<Utc>,
    /// Selected accommodation.
    pub accommodation: Option<Accommodation>,
    /// Selected food preference.
    pub food_preference: FoodPreference,
    /// Team facet for team events.
    pub team: TeamAssignment,
    /// Whether an existing unpaid registration was returned.
    pub resumed: bool,
}

impl RegistrationOutcome {
    /// Whether the caller still has to pay.
    #[must_use]
    pub const fn payment_required(&self) -> bool {
        !self.fee.is_free()
    }

    /// Free-path registrations are confirmed immediately and notified.
    #[must_use]
    pub const fn confirmed_on_insert(&self) -> bool {
        self.payment_status && !self.resumed
    }
}

/// Result of a team join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Joiner's new registration.
    pub registration_id: RegistrationId,
    /// Event joined.
    pub event_id: EventId,
    /// Event display name.
    pub event_name: String,
    /// Fee per capacity unit, paid by the lead.
    pub fee: Money,
    /// Insert time of the joiner's registration.
    pub registered_at: DateTime<Utc>,
    /// Team after the join.
    pub team: TeamSummary,
    /// Team lead.
    pub lead: TeamMember,
    /// Full roster after the join, lead included.
    pub members: Vec<TeamMember>,
    /// Joiner's accommodation.
    pub accommodation: Option<Accommodation>,
    /// Joiner's food preference.
    pub food_preference: FoodPreference,
}

/// Caller's registration as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSnapshot {
    /// Registration owner.
    pub user_id: UserId,
    /// Identifier.
    pub registration_id: RegistrationId,
    /// Event display name.
    pub event_name: String,
    /// Solo or team shape of the event.
    pub shape: EventShape,
    /// Insert time.
    pub registered_at: DateTime<Utc>,
    /// Whether the registration is paid.
    pub payment_status: bool,
    /// Check-in state.
    pub attendance_status: AttendanceStatus,
    /// Fee per capacity unit.
    pub fee: Money,
    /// Interpreted payment/team state.
    pub activation: ActivationState,
    /// Linked team.
    pub team: Option<TeamSummary>,
}

impl RegistrationSnapshot {
    /// Whether the owner leads the linked team.
    #[must_use]
    pub fn is_team_lead(&self) -> bool {
        self.team
            .as_ref()
            .is_some_and(|team| team.lead_id == self.user_id)
    }
}

/// Status endpoint answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationStatus {
    /// Caller has no registration for the event.
    NotRegistered,
    /// Caller's registration.
    Registered(Box<RegistrationSnapshot>),
}
