//! Teams, team names, and join codes.

use std::fmt;
use std::sync::OnceLock;

use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::identifier::define_numeric_id;
use super::UserId;

define_numeric_id! {
    /// Stable team identifier (`teams.team_id`).
    pub struct TeamId(i64);
}

/// Maximum length of a caller-supplied team name.
pub const TEAM_NAME_MAX: usize = 100;
/// Upper bound enforced by the `teams.team_name` and
/// `registrations.pending_team_name` columns.
pub const STORED_TEAM_NAME_MAX: usize = 160;
/// Length of a team join code.
pub const TEAM_CODE_LEN: usize = 6;
/// Attempts made to draw an unused join code before giving up.
pub const TEAM_CODE_ATTEMPTS: usize = 10;

const TEAM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

static TEAM_NAME_RE: OnceLock<Regex> = OnceLock::new();
static TEAM_CODE_RE: OnceLock<Regex> = OnceLock::new();
static SUFFIX_RE: OnceLock<Regex> = OnceLock::new();

fn team_name_regex() -> &'static Regex {
    TEAM_NAME_RE.get_or_init(|| {
        Regex::new(r"^(?-u:[\w\s\-()])+$")
            .unwrap_or_else(|error| panic!("team name regex failed to compile: {error}"))
    })
}

fn team_code_regex() -> &'static Regex {
    TEAM_CODE_RE.get_or_init(|| {
        Regex::new(r"^[A-Z0-9]{6}$")
            .unwrap_or_else(|error| panic!("team code regex failed to compile: {error}"))
    })
}

fn suffix_regex() -> &'static Regex {
    SUFFIX_RE.get_or_init(|| {
        Regex::new(r"^(?P<base>.*) \((?P<n>\d+)\)$")
            .unwrap_or_else(|error| panic!("suffix regex failed to compile: {error}"))
    })
}

/// Validation errors for team names and codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeamValidationError {
    /// Name is empty or longer than [`TEAM_NAME_MAX`] once trimmed.
    #[error("Team name must be between 1 and 100 characters")]
    NameLength,
    /// Name contains characters outside the allowed set.
    #[error("Team name contains invalid characters")]
    NameCharacters,
    /// Code is not six uppercase alphanumerics after normalisation.
    #[error("Invalid team code format. Must be 6 alphanumeric characters.")]
    CodeFormat,
}

/// Caller-supplied team name.
///
/// ## Invariants
/// - Trimmed, 1 to 100 characters.
/// - Only ASCII letters, digits, `_`, ASCII whitespace, `-`, `(` and `)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamName(String);

impl TeamName {
    /// Validate a caller-supplied name.
    ///
    /// # Examples
    /// ```
    /// use portal_backend::domain::TeamName;
    ///
    /// let name = TeamName::parse("  Rocket  ").expect("valid name");
    /// assert_eq!(name.as_ref(), "Rocket");
    /// assert!(TeamName::parse("Rocket!").is_err());
    /// ```
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, TeamValidationError> {
        let trimmed = raw.as_ref().trim();
        let length = trimmed.chars().count();
        if length == 0 || length > TEAM_NAME_MAX {
            return Err(TeamValidationError::NameLength);
        }
        if !team_name_regex().is_match(trimmed) {
            return Err(TeamValidationError::NameCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for TeamName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TeamName> for String {
    fn from(value: TeamName) -> Self {
        value.0
    }
}

impl TryFrom<String> for TeamName {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// How the team name for a new team lead is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamNameChoice {
    /// The caller supplied a name; a collision is a rejection.
    Explicit(TeamName),
    /// Derive a name from `base`, suffixing ` (N)` until it is unused.
    Generated {
        /// Unsuffixed candidate, usually `"{display name}'s Team"`.
        base: String,
    },
}

impl TeamNameChoice {
    /// Resolve the concrete name against the names already taken in the
    /// event.
    ///
    /// Returns `None` when an explicit name collides case-insensitively.
    #[must_use]
    pub fn resolve<'a, I>(&self, taken: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            Self::Explicit(name) => {
                let wanted = name.as_ref().to_lowercase();
                let collides = taken
                    .into_iter()
                    .any(|existing| existing.to_lowercase() == wanted);
                (!collides).then(|| name.as_ref().to_owned())
            }
            Self::Generated { base } => Some(next_available_name(base, taken)),
        }
    }
}

/// Pick `base` if unused, otherwise `base (N)` where `N` is one more than the
/// highest suffix already taken for that base.
///
/// Matching is case-insensitive. An unsuffixed `base` counts as suffix zero.
///
/// # Examples
/// ```
/// use portal_backend::domain::next_available_name;
///
/// assert_eq!(next_available_name("Noah's Team", []), "Noah's Team");
/// assert_eq!(
///     next_available_name("Noah's Team", ["noah's team"]),
///     "Noah's Team (1)"
/// );
/// assert_eq!(
///     next_available_name("Noah's Team", ["Noah's Team", "Noah's Team (4)"]),
///     "Noah's Team (5)"
/// );
/// ```
#[must_use]
pub fn next_available_name<'a, I>(base: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let base_lower = base.to_lowercase();
    let mut highest: Option<u64> = None;
    for existing in taken {
        let lower = existing.to_lowercase();
        if lower == base_lower {
            highest = Some(highest.unwrap_or(0));
            continue;
        }
        let Some(captures) = suffix_regex().captures(&lower) else {
            continue;
        };
        let same_base = captures
            .name("base")
            .is_some_and(|found| found.as_str() == base_lower);
        let suffix = captures
            .name("n")
            .and_then(|n| n.as_str().parse::<u64>().ok());
        if let (true, Some(n)) = (same_base, suffix) {
            highest = Some(highest.map_or(n, |current| current.max(n)));
        }
    }

    match highest {
        None => base.to_owned(),
        Some(n) => format!("{base} ({})", n.saturating_add(1)),
    }
}

/// Six-character join code, unique per event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamCode(String);

impl TeamCode {
    /// Normalise (trim, uppercase) and validate a caller-supplied code.
    ///
    /// # Examples
    /// ```
    /// use portal_backend::domain::TeamCode;
    ///
    /// let code = TeamCode::parse(" ab12cd ").expect("valid code");
    /// assert_eq!(code.as_ref(), "AB12CD");
    /// assert!(TeamCode::parse("AB12C").is_err());
    /// ```
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, TeamValidationError> {
        let normalised = raw.as_ref().trim().to_uppercase();
        if !team_code_regex().is_match(&normalised) {
            return Err(TeamValidationError::CodeFormat);
        }
        Ok(Self(normalised))
    }

    /// Draw a random code from `A-Z0-9` using the supplied generator.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..TEAM_CODE_LEN)
            .filter_map(|_| TEAM_CODE_ALPHABET.choose(rng).map(|byte| char::from(*byte)))
            .collect();
        Self(code)
    }

    /// Draw a random code from the thread-local generator.
    #[must_use]
    pub fn random() -> Self {
        Self::generate(&mut rand::thread_rng())
    }
}

impl AsRef<str> for TeamCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TeamCode> for String {
    fn from(value: TeamCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for TeamCode {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// A team member as listed on rosters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMember {
    /// Member account.
    pub user_id: UserId,
    /// Member display name.
    pub name: String,
}

/// Materialized team with its fill state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSummary {
    /// Identifier.
    pub id: TeamId,
    /// Unique (case-insensitively) name within the event.
    pub name: String,
    /// Join code.
    pub code: TeamCode,
    /// Creator and sole payer.
    pub lead_id: UserId,
    /// Members currently linked, lead included.
    pub current_members: u32,
    /// Event's lower team size bound.
    pub min_members: u32,
    /// Event's upper team size bound.
    pub max_members: u32,
}

impl TeamSummary {
    /// Whether no further members can join.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current_members >= self.max_members
    }

    /// Whether the team still has open seats.
    #[must_use]
    pub const fn can_invite_members(&self) -> bool {
        !self.is_full()
    }
}
