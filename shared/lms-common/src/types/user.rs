//! Member Types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::Error;

/// Portal role of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to content and administration.
    Admin,
    /// Lecturer. Reviews reflections and manages participants.
    #[serde(rename = "dozent")]
    Lecturer,
    /// Regular learner; sees only granted content.
    #[default]
    Participant,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Lecturer => "dozent",
            Self::Participant => "participant",
        }
    }

    /// Whether the role reviews reflection submissions.
    #[must_use]
    pub const fn is_reviewer(self) -> bool {
        matches!(self, Self::Admin | Self::Lecturer)
    }

    /// Parse a stored role, treating anything unrecognised as a participant.
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "dozent" => Ok(Self::Lecturer),
            "participant" => Ok(Self::Participant),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// User ID (shared with the identity provider).
    pub id: Uuid,
    /// Login e-mail address.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Portal role. Stored values outside the known set load as participant.
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Role,
    /// Deactivated members cannot sign in.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

const fn default_active() -> bool {
    true
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Role, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(Role::parse_or_default(raw.as_deref()))
}
