//! Access Grant Types
//!
//! Stored grants are loose rows with three optional anchor columns. In
//! memory they become a [`Grant`] whose [`GrantScope`] names exactly one
//! anchor. The disambiguation rule when several columns are set:
//!
//! 1. `unit_id` set: unit-scoped, whatever else is set
//! 2. else `module_id` set: module-scoped
//! 3. else `course_id` set: course-scoped
//! 4. else the row is rejected

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// The level a grant applies at, carrying the anchor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", content = "id", rename_all = "lowercase")]
pub enum GrantAnchor {
    Course(Uuid),
    Module(Uuid),
    Unit(Uuid),
}

impl GrantAnchor {
    /// Scope level name.
    #[must_use]
    pub const fn level(&self) -> &'static str {
        match self {
            Self::Course(_) => "course",
            Self::Module(_) => "module",
            Self::Unit(_) => "unit",
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Course(id) | Self::Module(id) | Self::Unit(id) => *id,
        }
    }
}

impl fmt::Display for GrantAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.level(), self.id())
    }
}

/// Scope of a grant. Module and unit grants may remember their course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantScope {
    Course {
        course_id: Uuid,
    },
    Module {
        course_id: Option<Uuid>,
        module_id: Uuid,
    },
    Unit {
        course_id: Option<Uuid>,
        module_id: Option<Uuid>,
        unit_id: Uuid,
    },
}

impl GrantScope {
    /// Apply the disambiguation rule to loose anchor columns.
    #[must_use]
    pub const fn from_columns(
        course_id: Option<Uuid>,
        module_id: Option<Uuid>,
        unit_id: Option<Uuid>,
    ) -> Option<Self> {
        match (course_id, module_id, unit_id) {
            (course_id, module_id, Some(unit_id)) => Some(Self::Unit {
                course_id,
                module_id,
                unit_id,
            }),
            (course_id, Some(module_id), None) => Some(Self::Module {
                course_id,
                module_id,
            }),
            (Some(course_id), None, None) => Some(Self::Course { course_id }),
            (None, None, None) => None,
        }
    }

    /// The anchor that decides which lookup level matches this grant.
    #[must_use]
    pub const fn anchor(&self) -> GrantAnchor {
        match *self {
            Self::Course { course_id } => GrantAnchor::Course(course_id),
            Self::Module { module_id, .. } => GrantAnchor::Module(module_id),
            Self::Unit { unit_id, .. } => GrantAnchor::Unit(unit_id),
        }
    }

    /// Course id stored on the grant, if any.
    #[must_use]
    pub const fn course_id(&self) -> Option<Uuid> {
        match *self {
            Self::Course { course_id } => Some(course_id),
            Self::Module { course_id, .. } | Self::Unit { course_id, .. } => course_id,
        }
    }

    /// Module id stored on the grant, if any.
    #[must_use]
    pub const fn module_id(&self) -> Option<Uuid> {
        match *self {
            Self::Course { .. } => None,
            Self::Module { module_id, .. } => Some(module_id),
            Self::Unit { module_id, .. } => module_id,
        }
    }

    /// Unit id, for unit-scoped grants only.
    #[must_use]
    pub const fn unit_id(&self) -> Option<Uuid> {
        match *self {
            Self::Unit { unit_id, .. } => Some(unit_id),
            _ => None,
        }
    }
}

impl From<GrantAnchor> for GrantScope {
    fn from(anchor: GrantAnchor) -> Self {
        match anchor {
            GrantAnchor::Course(course_id) => Self::Course { course_id },
            GrantAnchor::Module(module_id) => Self::Module {
                course_id: None,
                module_id,
            },
            GrantAnchor::Unit(unit_id) => Self::Unit {
                course_id: None,
                module_id: None,
                unit_id,
            },
        }
    }
}

/// An access grant for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrant", into = "RawGrant")]
pub struct Grant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub scope: GrantScope,
    /// `false` records an explicit revocation.
    pub is_granted: bool,
    /// Grant stays valid up to and including this instant.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Grant {
    /// Shorthand for [`GrantScope::anchor`].
    #[must_use]
    pub const fn anchor(&self) -> GrantAnchor {
        self.scope.anchor()
    }
}

/// Grant as stored: one row, three optional anchor columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub course_id: Option<Uuid>,
    #[serde(default)]
    pub module_id: Option<Uuid>,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
    pub is_granted: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RawGrant> for Grant {
    type Error = Error;

    fn try_from(raw: RawGrant) -> Result<Self, Self::Error> {
        let scope = GrantScope::from_columns(raw.course_id, raw.module_id, raw.unit_id)
            .ok_or(Error::UnanchoredGrant(raw.id))?;

        Ok(Self {
            id: raw.id,
            user_id: raw.user_id,
            scope,
            is_granted: raw.is_granted,
            expires_at: raw.expires_at,
            created_at: raw.created_at,
        })
    }
}

impl From<Grant> for RawGrant {
    fn from(grant: Grant) -> Self {
        Self {
            id: grant.id,
            user_id: grant.user_id,
            course_id: grant.scope.course_id(),
            module_id: grant.scope.module_id(),
            unit_id: grant.scope.unit_id(),
            is_granted: grant.is_granted,
            expires_at: grant.expires_at,
            created_at: grant.created_at,
        }
    }
}
