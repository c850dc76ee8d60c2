//! Request and response payloads for registration endpoints.
//!
//! Identifiers are JSON numbers, money is a two-place decimal string, and
//! timestamps are RFC 3339.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Accommodation, JoinOutcome, RegistrationOutcome, RegistrationSnapshot, RegistrationStatus,
    TeamAssignment, TeamMember, TeamSummary, UserId,
};

/// Body of `POST /registrations`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestBody {
    /// Event to register for.
    pub event_id: Option<i64>,
    /// Explicit team name for team events; generated when omitted.
    pub team_name: Option<String>,
    /// Selected accommodation.
    pub accommodation_id: Option<i32>,
    /// Food preference; defaults to "No food".
    pub food_pref: Option<String>,
}

/// Body of `POST /registrations/join-team`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinTeamRequestBody {
    /// Event the team belongs to.
    pub event_id: Option<i64>,
    /// Six-character join code.
    pub team_code: Option<String>,
    /// Selected accommodation.
    pub accommodation_id: Option<i32>,
    /// Food preference; defaults to "No food".
    pub food_pref: Option<String>,
}

/// Accommodation option.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccommodationResponse {
    pub id: i32,
    pub name: String,
}

impl From<Accommodation> for AccommodationResponse {
    fn from(value: Accommodation) -> Self {
        Self {
            id: value.id.get(),
            name: value.name,
        }
    }
}

/// Team fill state as seen by one member.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamInfoResponse {
    pub team_id: i64,
    pub team_name: String,
    pub team_code: String,
    pub is_team_lead: bool,
    pub current_members: u32,
    pub max_members: u32,
    pub min_members: u32,
    pub team_is_full: bool,
    pub can_invite_members: bool,
}

impl TeamInfoResponse {
    fn for_member(team: &TeamSummary, viewer: Option<UserId>) -> Self {
        Self {
            team_id: team.id.get(),
            team_name: team.name.clone(),
            team_code: team.code.to_string(),
            is_team_lead: viewer == Some(team.lead_id),
            current_members: team.current_members,
            max_members: team.max_members,
            min_members: team.min_members,
            team_is_full: team.is_full(),
            can_invite_members: team.can_invite_members(),
        }
    }

    /// Team seen by its lead.
    pub(crate) fn for_lead(team: &TeamSummary) -> Self {
        Self::for_member(team, Some(team.lead_id))
    }
}

/// Result of `POST /registrations`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub registration_id: i64,
    pub event_id: i64,
    pub event_name: String,
    /// `solo` or `team`.
    pub event_type: String,
    #[schema(value_type = String, example = "500.00")]
    pub fee_amount: String,
    pub payment_required: bool,
    pub payment_status: bool,
    pub timestamp: String,
    pub accommodation: Option<AccommodationResponse>,
    pub food_preference: String,
    /// Materialized team; absent until a paid lead completes payment.
    pub team_info: Option<TeamInfoResponse>,
    /// Name reserved for a team awaiting payment.
    pub pending_team_name: Option<String>,
    /// Whether an existing unpaid registration was returned.
    pub resumed: bool,
}

impl From<RegistrationOutcome> for RegistrationResponse {
    fn from(value: RegistrationOutcome) -> Self {
        let payment_required = value.payment_required();
        let (team_info, pending_team_name) = match &value.team {
            TeamAssignment::None => (None, None),
            TeamAssignment::Pending { name } => (None, Some(name.clone())),
            TeamAssignment::Active(team) => (Some(TeamInfoResponse::for_lead(team)), None),
        };
        Self {
            registration_id: value.registration_id.get(),
            event_id: value.event_id.get(),
            event_name: value.event_name,
            event_type: value.shape.label().to_owned(),
            fee_amount: value.fee.to_string(),
            payment_required,
            payment_status: value.payment_status,
            timestamp: value.registered_at.to_rfc3339(),
            accommodation: value.accommodation.map(AccommodationResponse::from),
            food_preference: value.food_preference.as_ref().to_owned(),
            team_info,
            pending_team_name,
            resumed: value.resumed,
        }
    }
}

/// Team member reference.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: i64,
    pub name: String,
}

impl From<TeamMember> for MemberResponse {
    fn from(value: TeamMember) -> Self {
        Self {
            id: value.user_id.get(),
            name: value.name,
        }
    }
}

/// Result of `POST /registrations/join-team`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinTeamResponse {
    pub registration_id: i64,
    pub event_id: i64,
    pub event_name: String,
    pub event_type: String,
    pub team_id: i64,
    pub team_name: String,
    pub team_code: String,
    pub team_lead: MemberResponse,
    pub is_team_lead: bool,
    pub team_members: Vec<MemberResponse>,
    pub current_members: u32,
    pub max_members: u32,
    pub min_members: u32,
    pub team_is_full: bool,
    #[schema(value_type = String, example = "500.00")]
    pub fee_amount: String,
    pub payment_required: bool,
    pub payment_status: bool,
    pub timestamp: String,
    pub accommodation: Option<AccommodationResponse>,
    pub food_preference: String,
}

impl From<JoinOutcome> for JoinTeamResponse {
    fn from(value: JoinOutcome) -> Self {
        let team = value.team;
        Self {
            registration_id: value.registration_id.get(),
            event_id: value.event_id.get(),
            event_name: value.event_name,
            event_type: "team".to_owned(),
            team_id: team.id.get(),
            team_is_full: team.is_full(),
            team_name: team.name,
            team_code: team.code.to_string(),
            team_lead: MemberResponse::from(value.lead),
            is_team_lead: false,
            team_members: value.members.into_iter().map(MemberResponse::from).collect(),
            current_members: team.current_members,
            max_members: team.max_members,
            min_members: team.min_members,
            fee_amount: value.fee.to_string(),
            payment_required: !value.fee.is_free(),
            payment_status: true,
            timestamp: value.registered_at.to_rfc3339(),
            accommodation: value.accommodation.map(AccommodationResponse::from),
            food_preference: value.food_preference.as_ref().to_owned(),
        }
    }
}

/// Result of `GET /registrations/status/{eventId}`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatusResponse {
    pub is_registered: bool,
    pub registration_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "500.00")]
    pub fee_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_required: Option<bool>,
    /// `unpaid_no_team`, `unpaid_existing_team`, `paid_team_active` or
    /// `paid_no_team`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_team_name: Option<String>,
    pub team_info: Option<TeamInfoResponse>,
}

impl RegistrationStatusResponse {
    fn not_registered() -> Self {
        Self {
            is_registered: false,
            registration_id: None,
            event_name: None,
            event_type: None,
            timestamp: None,
            payment_status: None,
            attendance_status: None,
            fee_amount: None,
            payment_required: None,
            activation: None,
            pending_team_name: None,
            team_info: None,
        }
    }

    fn registered(snapshot: RegistrationSnapshot) -> Self {
        let team_info = snapshot
            .team
            .as_ref()
            .map(|team| TeamInfoResponse::for_member(team, Some(snapshot.user_id)));
        Self {
            is_registered: true,
            registration_id: Some(snapshot.registration_id.get()),
            event_name: Some(snapshot.event_name),
            event_type: Some(snapshot.shape.label().to_owned()),
            timestamp: Some(snapshot.registered_at.to_rfc3339()),
            payment_status: Some(snapshot.payment_status),
            attendance_status: Some(snapshot.attendance_status.as_str().to_owned()),
            fee_amount: Some(snapshot.fee.to_string()),
            payment_required: Some(!snapshot.fee.is_free()),
            activation: Some(snapshot.activation.label().to_owned()),
            pending_team_name: snapshot.activation.pending_team_name().map(str::to_owned),
            team_info,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusResponse {
    fn from(value: RegistrationStatus) -> Self {
        match value {
            RegistrationStatus::NotRegistered => Self::not_registered(),
            RegistrationStatus::Registered(snapshot) => Self::registered(*snapshot),
        }
    }
}
