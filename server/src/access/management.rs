//! Grant management.
//!
//! Upserts and clean-ups over the grant list. A member has at most one
//! grant per anchor; writes find it by anchor and update in place.

use chrono::{DateTime, Utc};
use lms_common::{Grant, GrantAnchor, GrantScope, Module, Unit};
use serde::Serialize;
use uuid::Uuid;

use super::error::AccessError;
use super::resolver::Viewer;

/// What to do with `expires_at` on an existing grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryUpdate {
    /// Leave the stored value alone.
    #[default]
    Keep,
    /// Overwrite; `None` clears the expiry.
    Set(Option<DateTime<Utc>>),
}

impl ExpiryUpdate {
    const fn for_insert(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Keep => None,
            Self::Set(expires_at) => expires_at,
        }
    }
}

/// A requested grant write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantChange {
    pub user_id: Uuid,
    pub anchor: GrantAnchor,
    /// Course the anchor lives in, stored on new module and unit grants.
    pub course_id: Option<Uuid>,
    pub is_granted: bool,
    pub expiry: ExpiryUpdate,
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "grant_id", rename_all = "lowercase")]
pub enum GrantWrite {
    Inserted(Uuid),
    Updated(Uuid),
}

impl GrantWrite {
    #[must_use]
    pub const fn grant_id(&self) -> Uuid {
        match self {
            Self::Inserted(id) | Self::Updated(id) => *id,
        }
    }
}

/// Grant management is an administrator action.
pub fn require_grant_admin(actor: &Viewer) -> Result<(), AccessError> {
    if actor.bypasses_grants() {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}

fn scope_for(anchor: GrantAnchor, course_id: Option<Uuid>) -> GrantScope {
    match anchor {
        GrantAnchor::Course(course_id) => GrantScope::Course { course_id },
        GrantAnchor::Module(module_id) => GrantScope::Module {
            course_id,
            module_id,
        },
        GrantAnchor::Unit(unit_id) => GrantScope::Unit {
            course_id,
            module_id: None,
            unit_id,
        },
    }
}

/// Insert or update the member's grant for `change.anchor`.
#[tracing::instrument(skip(grants))]
pub fn set_grant(grants: &mut Vec<Grant>, change: &GrantChange, now: DateTime<Utc>) -> GrantWrite {
    if let Some(existing) = grants
        .iter_mut()
        .find(|g| g.user_id == change.user_id && g.anchor() == change.anchor)
    {
        existing.is_granted = change.is_granted;
        if let ExpiryUpdate::Set(expires_at) = change.expiry {
            existing.expires_at = expires_at;
        }
        return GrantWrite::Updated(existing.id);
    }

    let grant = Grant {
        id: Uuid::now_v7(),
        user_id: change.user_id,
        scope: scope_for(change.anchor, change.course_id),
        is_granted: change.is_granted,
        expires_at: change.expiry.for_insert(),
        created_at: now,
    };
    let id = grant.id;
    grants.push(grant);
    tracing::debug!(grant_id = %id, anchor = %change.anchor, "Grant created");
    GrantWrite::Inserted(id)
}

/// Change the expiry of an existing grant only.
#[tracing::instrument(skip(grants))]
pub fn update_grant_expiration(
    grants: &mut [Grant],
    user_id: Uuid,
    anchor: GrantAnchor,
    expires_at: Option<DateTime<Utc>>,
) -> Result<Uuid, AccessError> {
    let grant = grants
        .iter_mut()
        .find(|g| g.user_id == user_id && g.anchor() == anchor)
        .ok_or(AccessError::GrantNotFound { user_id, anchor })?;

    grant.expires_at = expires_at;
    Ok(grant.id)
}

/// Set the course-level grant and drop the member's module and unit grants
/// inside the course, so the course grant alone decides access.
#[allow(clippy::too_many_arguments)]
#[tracing::instrument(skip(grants, modules, units))]
pub fn set_course_level_access(
    grants: &mut Vec<Grant>,
    user_id: Uuid,
    course_id: Uuid,
    modules: &[Module],
    units: &[Unit],
    is_granted: bool,
    expiry: ExpiryUpdate,
    now: DateTime<Utc>,
) -> GrantWrite {
    let write = set_grant(
        grants,
        &GrantChange {
            user_id,
            anchor: GrantAnchor::Course(course_id),
            course_id: Some(course_id),
            is_granted,
            expiry,
        },
        now,
    );

    let module_ids: Vec<Uuid> = modules
        .iter()
        .filter(|m| m.course_id == course_id)
        .map(|m| m.id)
        .collect();
    let unit_ids: Vec<Uuid> = units
        .iter()
        .filter(|u| u.course_id == course_id)
        .map(|u| u.id)
        .collect();

    let before = grants.len();
    grants.retain(|g| {
        if g.user_id != user_id {
            return true;
        }
        match g.anchor() {
            GrantAnchor::Module(id) => !module_ids.contains(&id),
            GrantAnchor::Unit(id) => !unit_ids.contains(&id),
            GrantAnchor::Course(_) => true,
        }
    });
    tracing::debug!(removed = before - grants.len(), "Cleared finer grants");

    write
}

/// Set the course-level grant for every listed participant. Returns the
/// number of members written.
#[tracing::instrument(skip(grants, participants), fields(participants = participants.len()))]
pub fn set_course_access_for_all(
    grants: &mut Vec<Grant>,
    course_id: Uuid,
    participants: &[Uuid],
    is_granted: bool,
    now: DateTime<Utc>,
) -> usize {
    for user_id in participants {
        set_grant(
            grants,
            &GrantChange {
                user_id: *user_id,
                anchor: GrantAnchor::Course(course_id),
                course_id: Some(course_id),
                is_granted,
                expiry: ExpiryUpdate::Keep,
            },
            now,
        );
    }
    participants.len()
}

/// Course-level grants of every member for one course.
pub fn course_level_grants(grants: &[Grant], course_id: Uuid) -> Vec<&Grant> {
    grants
        .iter()
        .filter(|g| g.anchor() == GrantAnchor::Course(course_id))
        .collect()
}
