//! Member management.
//!
//! Administrators manage everyone. Lecturers manage participants only and
//! cannot change roles. Nobody deactivates themselves.

pub mod types;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use lms_common::{GrantAnchor, Profile, Role};
use thiserror::Error;
use uuid::Uuid;

use crate::access::{require_grant_admin, set_grant, ExpiryUpdate, GrantChange, Viewer};
use crate::store::StoreData;

pub use types::{
    CourseAssignment, CreateMemberRequest, MemberAccessOverview, SetMemberStatusRequest,
    UpdateMemberRequest,
};

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemberError {
    #[error("Member not found")]
    NotFound,

    #[error("Only administrators and lecturers may manage members")]
    NotManager,

    #[error("Lecturers may only manage participants")]
    ParticipantsOnly,

    #[error("Only administrators may manage access")]
    AdminOnly,

    #[error("You cannot deactivate yourself")]
    SelfDeactivation,

    #[error("E-mail address already taken")]
    EmailTaken,

    #[error("Course not found: {0}")]
    UnknownCourse(Uuid),

}

impl IntoResponse for MemberError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            Self::NotManager | Self::ParticipantsOnly | Self::AdminOnly | Self::SelfDeactivation => {
                (StatusCode::FORBIDDEN, "forbidden")
            }
            Self::EmailTaken => (StatusCode::CONFLICT, "email_taken"),
            Self::UnknownCourse(_) => (StatusCode::BAD_REQUEST, "validation"),
        };
        (
            status,
            Json(serde_json::json!({"error": code, "message": self.to_string()})),
        )
            .into_response()
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Admins and lecturers manage members.
pub fn require_member_manager(actor: &Viewer) -> Result<(), MemberError> {
    if actor.role.is_reviewer() {
        Ok(())
    } else {
        Err(MemberError::NotManager)
    }
}

/// Lecturers may only touch participants.
pub fn ensure_can_manage(actor: &Viewer, target: &Profile) -> Result<(), MemberError> {
    require_member_manager(actor)?;
    if actor.role == Role::Lecturer && target.role != Role::Participant {
        return Err(MemberError::ParticipantsOnly);
    }
    Ok(())
}

/// Role a new member ends up with.
pub fn effective_new_role(actor: &Viewer, requested: Option<Role>) -> Role {
    match actor.role {
        Role::Admin => requested.unwrap_or_default(),
        _ => Role::Participant,
    }
}

fn email_taken(data: &StoreData, email: &str, except: Option<Uuid>) -> bool {
    data.profiles
        .iter()
        .any(|p| Some(p.id) != except && p.email.eq_ignore_ascii_case(email))
}

// ============================================================================
// Operations
// ============================================================================

/// All members, newest first.
pub fn list_members(data: &StoreData, actor: &Viewer) -> Result<Vec<Profile>, MemberError> {
    require_member_manager(actor)?;

    let mut members = data.profiles.clone();
    members.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(members)
}

/// Create a profile and its initial course grants.
#[tracing::instrument(skip(data, request), fields(email = %request.email))]
pub fn create_member(
    data: &mut StoreData,
    actor: &Viewer,
    request: CreateMemberRequest,
    now: DateTime<Utc>,
) -> Result<Profile, MemberError> {
    require_member_manager(actor)?;

    let email = request.email.trim().to_string();
    if email_taken(data, &email, None) {
        return Err(MemberError::EmailTaken);
    }
    if let Some(missing) = request
        .course_assignments
        .iter()
        .find(|a| data.course(a.course_id).is_none())
    {
        return Err(MemberError::UnknownCourse(missing.course_id));
    }

    let profile = Profile {
        id: Uuid::now_v7(),
        email,
        full_name: request.full_name.trim().to_string(),
        role: effective_new_role(actor, request.role),
        is_active: true,
        created_at: now,
    };

    for assignment in &request.course_assignments {
        set_grant(
            &mut data.grants,
            &GrantChange {
                user_id: profile.id,
                anchor: GrantAnchor::Course(assignment.course_id),
                course_id: Some(assignment.course_id),
                is_granted: true,
                expiry: ExpiryUpdate::Set(assignment.expires_at),
            },
            now,
        );
    }

    data.profiles.push(profile.clone());
    tracing::info!(member_id = %profile.id, role = %profile.role, "Member created");
    Ok(profile)
}

/// Update name and e-mail; the role only when an administrator asks.
#[tracing::instrument(skip(data, request))]
pub fn update_member(
    data: &mut StoreData,
    actor: &Viewer,
    member_id: Uuid,
    request: UpdateMemberRequest,
) -> Result<Profile, MemberError> {
    let target = data.profile(member_id).ok_or(MemberError::NotFound)?;
    ensure_can_manage(actor, target)?;

    let email = request.email.trim().to_string();
    if email_taken(data, &email, Some(member_id)) {
        return Err(MemberError::EmailTaken);
    }

    let profile = data.profile_mut(member_id).ok_or(MemberError::NotFound)?;
    profile.email = email;
    profile.full_name = request.full_name.trim().to_string();
    if let (Role::Admin, Some(role)) = (actor.role, request.role) {
        profile.role = role;
    }
    Ok(profile.clone())
}

/// Activate or deactivate a member.
#[tracing::instrument(skip(data))]
pub fn set_member_active(
    data: &mut StoreData,
    actor: &Viewer,
    member_id: Uuid,
    is_active: bool,
) -> Result<Profile, MemberError> {
    require_member_manager(actor)?;
    if member_id == actor.user_id {
        return Err(MemberError::SelfDeactivation);
    }

    let target = data.profile(member_id).ok_or(MemberError::NotFound)?;
    ensure_can_manage(actor, target)?;

    let profile = data.profile_mut(member_id).ok_or(MemberError::NotFound)?;
    profile.is_active = is_active;
    Ok(profile.clone())
}

/// A member's grants plus the whole hierarchy, for the access editor.
pub fn member_access(
    data: &StoreData,
    actor: &Viewer,
    member_id: Uuid,
) -> Result<MemberAccessOverview, MemberError> {
    require_grant_admin(actor).map_err(|_| MemberError::AdminOnly)?;
    let member = data.profile(member_id).ok_or(MemberError::NotFound)?.clone();

    Ok(MemberAccessOverview {
        grants: data.grants_for(member_id),
        courses: data.courses.clone(),
        modules: data.modules.clone(),
        units: data.units.clone(),
        member,
    })
}
