//! Administration Handlers
//!
//! Member management, grant management, assignments and the reflection
//! review queue. Policy checks live in the domain modules; handlers only
//! validate input, take the store lock and stamp the time.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use lms_common::{Assignment, Feedback, Grant, Profile, Submission};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use super::{ApiError, AppState, AuthUser};
use crate::access::{
    course_level_grants, require_grant_admin, set_course_access_for_all, set_course_level_access,
    set_grant, update_grant_expiration, AccessError, BulkAccessResult, CourseAccessForAllRequest,
    CourseMemberAccessRequest, GrantChange, GrantWrite, SetGrantRequest, UpdateExpirationRequest,
};
use crate::members::{
    self, CreateMemberRequest, MemberAccessOverview, SetMemberStatusRequest, UpdateMemberRequest,
};
use crate::submissions::{
    self, CreateFeedbackRequest, ReflectionStats, SubmissionDetails, SubmissionFilter,
    UpdateStatusRequest, UpsertAssignmentRequest,
};

// ============================================================================
// Members
// ============================================================================

/// `GET /api/admin/members`
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let data = state.store.read().await;
    Ok(Json(members::list_members(&data, &auth.viewer())?))
}

/// `POST /api/admin/members`
#[tracing::instrument(skip(state, auth, body), fields(actor = %auth.id))]
pub async fn create_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    body.validate()?;

    let mut data = state.store.write().await;
    let profile = members::create_member(&mut data, &auth.viewer(), body, Utc::now())?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// `PATCH /api/admin/members/{id}`
#[tracing::instrument(skip(state, auth, body), fields(actor = %auth.id))]
pub async fn update_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(member_id): Path<Uuid>,
    Json(body): Json<UpdateMemberRequest>,
) -> Result<Json<Profile>, ApiError> {
    body.validate()?;

    let mut data = state.store.write().await;
    Ok(Json(members::update_member(
        &mut data,
        &auth.viewer(),
        member_id,
        body,
    )?))
}

/// `PUT /api/admin/members/{id}/status`
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn set_member_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(member_id): Path<Uuid>,
    Json(body): Json<SetMemberStatusRequest>,
) -> Result<Json<Profile>, ApiError> {
    let mut data = state.store.write().await;
    Ok(Json(members::set_member_active(
        &mut data,
        &auth.viewer(),
        member_id,
        body.is_active,
    )?))
}

/// `GET /api/admin/members/{id}/access`
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn member_access(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(member_id): Path<Uuid>,
) -> Result<Json<MemberAccessOverview>, ApiError> {
    let data = state.store.read().await;
    Ok(Json(members::member_access(
        &data,
        &auth.viewer(),
        member_id,
    )?))
}

// ============================================================================
// Grants
// ============================================================================

/// `PUT /api/admin/grants`
///
/// Upsert one grant. Module and unit grants get their course filled in.
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn put_grant(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SetGrantRequest>,
) -> Result<Json<GrantWrite>, ApiError> {
    require_grant_admin(&auth.viewer())?;

    let mut data = state.store.write().await;
    if data.profile(body.user_id).is_none() {
        return Err(AccessError::NotFound.into());
    }
    let course_id = data
        .anchor_course(body.anchor)
        .ok_or(AccessError::NotFound)?;

    let change = GrantChange {
        user_id: body.user_id,
        anchor: body.anchor,
        course_id: Some(course_id),
        is_granted: body.is_granted,
        expiry: body.expiry(),
    };
    Ok(Json(set_grant(&mut data.grants, &change, Utc::now())))
}

#[derive(Debug, Serialize)]
pub struct GrantIdResponse {
    pub grant_id: Uuid,
}

/// `PUT /api/admin/grants/expiration`
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn put_grant_expiration(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateExpirationRequest>,
) -> Result<Json<GrantIdResponse>, ApiError> {
    require_grant_admin(&auth.viewer())?;

    let mut data = state.store.write().await;
    let grant_id =
        update_grant_expiration(&mut data.grants, body.user_id, body.anchor, body.expires_at)?;
    Ok(Json(GrantIdResponse { grant_id }))
}

/// `PUT /api/admin/courses/{course_id}/members/{user_id}/access`
///
/// Course-level grant for one member; drops their finer grants in the
/// course.
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn put_course_member_access(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((course_id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<CourseMemberAccessRequest>,
) -> Result<Json<GrantWrite>, ApiError> {
    require_grant_admin(&auth.viewer())?;

    let mut data = state.store.write().await;
    if data.course(course_id).is_none() || data.profile(user_id).is_none() {
        return Err(AccessError::NotFound.into());
    }

    let data = &mut *data;
    let write = set_course_level_access(
        &mut data.grants,
        user_id,
        course_id,
        &data.modules,
        &data.units,
        body.is_granted,
        body.expiry(),
        Utc::now(),
    );
    Ok(Json(write))
}

/// `PUT /api/admin/courses/{course_id}/access`
///
/// Course-level grant for every participant.
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn put_course_access_for_all(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<Uuid>,
    Json(body): Json<CourseAccessForAllRequest>,
) -> Result<Json<BulkAccessResult>, ApiError> {
    require_grant_admin(&auth.viewer())?;

    let mut data = state.store.write().await;
    if data.course(course_id).is_none() {
        return Err(AccessError::NotFound.into());
    }

    let participants = data.participant_ids();
    let updated = set_course_access_for_all(
        &mut data.grants,
        course_id,
        &participants,
        body.is_granted,
        Utc::now(),
    );
    Ok(Json(BulkAccessResult { course_id, updated }))
}

/// `GET /api/admin/courses/{course_id}/access`
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn get_course_access(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<Grant>>, ApiError> {
    require_grant_admin(&auth.viewer())?;

    let data = state.store.read().await;
    if data.course(course_id).is_none() {
        return Err(AccessError::NotFound.into());
    }
    Ok(Json(
        course_level_grants(&data.grants, course_id)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

// ============================================================================
// Assignments
// ============================================================================

/// `PUT /api/admin/units/{unit_id}/assignment`
#[tracing::instrument(skip(state, auth, body), fields(actor = %auth.id))]
pub async fn put_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(unit_id): Path<Uuid>,
    Json(body): Json<UpsertAssignmentRequest>,
) -> Result<Json<Assignment>, ApiError> {
    body.validate()?;

    let mut data = state.store.write().await;
    Ok(Json(submissions::upsert_assignment(
        &mut data,
        &auth.viewer(),
        unit_id,
        body,
        Utc::now(),
    )?))
}

/// `DELETE /api/admin/units/{unit_id}/assignment`
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(unit_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut data = state.store.write().await;
    submissions::delete_assignment(&mut data, &auth.viewer(), unit_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Review Queue
// ============================================================================

/// `GET /api/admin/submissions[?status=]`
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn list_submissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<SubmissionFilter>,
) -> Result<Json<Vec<SubmissionDetails>>, ApiError> {
    let data = state.store.read().await;
    Ok(Json(submissions::list_submissions(
        &data,
        &auth.viewer(),
        filter.status,
    )?))
}

/// `GET /api/admin/submissions/stats`
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn submission_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ReflectionStats>, ApiError> {
    let data = state.store.read().await;
    Ok(Json(submissions::stats(&data, &auth.viewer())?))
}

/// `GET /api/admin/submissions/{id}`
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn get_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(submission_id): Path<Uuid>,
) -> Result<Json<SubmissionDetails>, ApiError> {
    let data = state.store.read().await;
    Ok(Json(submissions::submission_by_id(
        &data,
        &auth.viewer(),
        submission_id,
    )?))
}

/// `PUT /api/admin/submissions/{id}/status`
#[tracing::instrument(skip(state, auth), fields(actor = %auth.id))]
pub async fn put_submission_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(submission_id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Submission>, ApiError> {
    let mut data = state.store.write().await;
    Ok(Json(submissions::update_status(
        &mut data,
        &auth.viewer(),
        submission_id,
        body.status,
        body.assigned_to,
    )?))
}

/// `POST /api/admin/submissions/{id}/feedback`
#[tracing::instrument(skip(state, auth, body), fields(actor = %auth.id))]
pub async fn create_feedback(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(submission_id): Path<Uuid>,
    Json(body): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<Feedback>), ApiError> {
    body.validate()?;

    let mut data = state.store.write().await;
    let feedback = submissions::add_feedback(
        &mut data,
        &auth.viewer(),
        submission_id,
        body,
        state.config.max_submission_length,
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(feedback)))
}
