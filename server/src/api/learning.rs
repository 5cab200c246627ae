//! Member-Facing Handlers
//!
//! Dashboard, course viewer, unit navigation and the member's own
//! reflections. Content the caller cannot open answers 404, the same as
//! content that does not exist.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use lms_common::{Assignment, Submission};
use uuid::Uuid;
use validator::Validate;

use super::{ApiError, AppState, AuthUser};
use crate::access::{
    accessible_courses_with_counts, course_with_access, expired_course_names, expiring_grants,
    unit_navigation, AccessNotices, CourseWithAccess, CourseWithCounts, ExpiringNotice,
    UnitNavigation,
};
use crate::submissions::{self, CreateSubmissionRequest, SubmissionDetails};

// ============================================================================
// Courses
// ============================================================================

/// `GET /api/me/courses`
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn my_courses(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Json<Vec<CourseWithCounts>> {
    let data = state.store.read().await;
    let snapshot = data.access_snapshot(auth.id);
    Json(accessible_courses_with_counts(
        &auth.viewer(),
        &snapshot,
        Utc::now(),
    ))
}

/// `GET /api/me/notices`
///
/// Lapsed courses plus grants running out within the warning window.
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn my_notices(State(state): State<AppState>, auth: AuthUser) -> Json<AccessNotices> {
    let now = Utc::now();
    let viewer = auth.viewer();
    let data = state.store.read().await;
    let snapshot = data.access_snapshot(auth.id);

    let expiring = if viewer.bypasses_grants() {
        Vec::new()
    } else {
        expiring_grants(&snapshot.grants, now, state.config.expiry_warning_window())
            .into_iter()
            .map(|grant| ExpiringNotice {
                grant_id: grant.id,
                anchor: grant.anchor(),
                name: data.anchor_name(grant.anchor()).map(str::to_owned),
                expires_at: grant.expires_at,
            })
            .collect()
    };

    Json(AccessNotices {
        expired_courses: expired_course_names(&viewer, &snapshot, now),
        expiring,
    })
}

/// `GET /api/courses/{course_id}`
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn get_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseWithAccess>, ApiError> {
    let data = state.store.read().await;
    let snapshot = data.access_snapshot(auth.id);
    course_with_access(&auth.viewer(), &snapshot, course_id, Utc::now())
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// `GET /api/courses/{course_id}/units/{unit_id}`
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn get_unit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((course_id, unit_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<UnitNavigation>, ApiError> {
    let data = state.store.read().await;
    let snapshot = data.access_snapshot(auth.id);
    unit_navigation(&auth.viewer(), &snapshot, course_id, unit_id, Utc::now())
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// ============================================================================
// Reflections
// ============================================================================

/// `GET /api/units/{unit_id}/assignment`
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn get_unit_assignment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(unit_id): Path<Uuid>,
) -> Result<Json<Option<Assignment>>, ApiError> {
    let data = state.store.read().await;
    let assignment =
        submissions::assignment_for_unit(&data, &auth.viewer(), unit_id, Utc::now())?;
    Ok(Json(assignment))
}

/// `GET /api/me/submissions`
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn my_submissions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Json<Vec<SubmissionDetails>> {
    let data = state.store.read().await;
    Json(submissions::my_submissions(&data, &auth.viewer()))
}

/// `GET /api/assignments/{assignment_id}/submission`
///
/// The caller's latest answer, `null` if none yet.
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn my_latest_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(assignment_id): Path<Uuid>,
) -> Json<Option<SubmissionDetails>> {
    let data = state.store.read().await;
    Json(submissions::my_submission_for_assignment(
        &data,
        &auth.viewer(),
        assignment_id,
    ))
}

/// `POST /api/assignments/{assignment_id}/submissions`
#[tracing::instrument(skip(state, auth, body), fields(user_id = %auth.id))]
pub async fn create_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(assignment_id): Path<Uuid>,
    Json(body): Json<CreateSubmissionRequest>,
) -> Result<Json<Submission>, ApiError> {
    body.validate()?;

    let mut data = state.store.write().await;
    let submission = submissions::create_submission(
        &mut data,
        &auth.viewer(),
        assignment_id,
        body,
        state.config.max_submission_length,
        Utc::now(),
    )?;
    Ok(Json(submission))
}
