//! Reflection assignments, submissions and reviewer feedback.
//!
//! Participants answer the active assignment of a unit they can open.
//! Reviewers (administrators and lecturers) work the queue.

pub mod types;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use lms_common::{Assignment, Feedback, Role, Submission, SubmissionStatus};
use thiserror::Error;
use uuid::Uuid;

use crate::access::Viewer;
use crate::store::StoreData;

pub use types::{
    CreateFeedbackRequest, CreateSubmissionRequest, FeedbackWithReviewer, PersonSummary,
    ReflectionStats, SubmissionDetails, SubmissionFilter, UpdateStatusRequest,
    UpsertAssignmentRequest,
};

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    /// Missing, or hidden from the caller.
    #[error("Not found")]
    NotFound,

    #[error("Only reviewers may do this")]
    NotReviewer,

    #[error("Content must not be empty")]
    EmptyContent,

    #[error("Content exceeds {max} characters")]
    ContentTooLong { max: usize },

}

impl IntoResponse for SubmissionError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            Self::NotReviewer => (StatusCode::FORBIDDEN, "forbidden"),
            Self::EmptyContent | Self::ContentTooLong { .. } => (StatusCode::BAD_REQUEST, "validation"),
        };
        (
            status,
            Json(serde_json::json!({"error": code, "message": self.to_string()})),
        )
            .into_response()
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn require_reviewer(actor: &Viewer) -> Result<(), SubmissionError> {
    if actor.role.is_reviewer() {
        Ok(())
    } else {
        Err(SubmissionError::NotReviewer)
    }
}

/// Trim and bound free-text content.
pub fn check_content(content: &str, max: usize) -> Result<&str, SubmissionError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(SubmissionError::EmptyContent);
    }
    if trimmed.chars().count() > max {
        return Err(SubmissionError::ContentTooLong { max });
    }
    Ok(trimmed)
}

/// Whether the viewer may open `unit_id` right now.
fn can_open_unit(data: &StoreData, viewer: &Viewer, unit_id: Uuid, now: DateTime<Utc>) -> bool {
    if viewer.role.is_reviewer() {
        return data.unit(unit_id).is_some();
    }
    let snapshot = data.access_snapshot(viewer.user_id);
    snapshot
        .units
        .iter()
        .find(|u| u.id == unit_id)
        .is_some_and(|unit| snapshot.resolver(now).has_unit_access(unit))
}

fn details(data: &StoreData, submission: &Submission) -> SubmissionDetails {
    let assignment = data
        .assignments
        .iter()
        .find(|a| a.id == submission.assignment_id)
        .cloned();
    let unit = assignment
        .as_ref()
        .and_then(|a| data.unit(a.unit_id))
        .cloned();

    let mut feedback: Vec<FeedbackWithReviewer> = data
        .feedback
        .iter()
        .filter(|f| f.submission_id == submission.id)
        .map(|f| FeedbackWithReviewer {
            reviewer: data.profile(f.reviewer_id).map(PersonSummary::from),
            feedback: f.clone(),
        })
        .collect();
    feedback.sort_by_key(|f| f.feedback.created_at);

    SubmissionDetails {
        user: data.profile(submission.user_id).map(PersonSummary::from),
        submission: submission.clone(),
        assignment,
        unit,
        feedback,
    }
}

fn newest_first<'a>(submissions: impl Iterator<Item = &'a Submission>) -> Vec<&'a Submission> {
    let mut list: Vec<&Submission> = submissions.collect();
    list.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    list
}

// ============================================================================
// Assignments
// ============================================================================

/// Active assignment of a unit with the lowest `order_index`.
pub fn active_assignment(data: &StoreData, unit_id: Uuid) -> Option<&Assignment> {
    data.assignments
        .iter()
        .filter(|a| a.unit_id == unit_id && a.is_active)
        .min_by_key(|a| (a.order_index, a.id))
}

/// Assignment shown on a unit page. Units the viewer cannot open are
/// reported as missing.
pub fn assignment_for_unit(
    data: &StoreData,
    viewer: &Viewer,
    unit_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<Assignment>, SubmissionError> {
    if !can_open_unit(data, viewer, unit_id, now) {
        return Err(SubmissionError::NotFound);
    }
    Ok(active_assignment(data, unit_id).cloned())
}

/// Replace the unit's assignment text, or create one.
#[tracing::instrument(skip(data, request))]
pub fn upsert_assignment(
    data: &mut StoreData,
    actor: &Viewer,
    unit_id: Uuid,
    request: UpsertAssignmentRequest,
    now: DateTime<Utc>,
) -> Result<Assignment, SubmissionError> {
    require_reviewer(actor)?;
    if data.unit(unit_id).is_none() {
        return Err(SubmissionError::NotFound);
    }

    let title = request.title.trim().to_string();
    let description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    if let Some(existing) = data.assignments.iter_mut().find(|a| a.unit_id == unit_id) {
        existing.title = title;
        existing.description = description;
        return Ok(existing.clone());
    }

    let assignment = Assignment {
        id: Uuid::now_v7(),
        unit_id,
        title,
        description,
        order_index: 0,
        is_active: true,
        created_at: now,
    };
    data.assignments.push(assignment.clone());
    tracing::info!(assignment_id = %assignment.id, "Assignment created");
    Ok(assignment)
}

/// Remove every assignment of a unit. Returns how many were removed.
#[tracing::instrument(skip(data))]
pub fn delete_assignment(
    data: &mut StoreData,
    actor: &Viewer,
    unit_id: Uuid,
) -> Result<usize, SubmissionError> {
    require_reviewer(actor)?;
    let before = data.assignments.len();
    data.assignments.retain(|a| a.unit_id != unit_id);
    Ok(before - data.assignments.len())
}

// ============================================================================
// Participant Side
// ============================================================================

#[tracing::instrument(skip(data, request))]
pub fn create_submission(
    data: &mut StoreData,
    viewer: &Viewer,
    assignment_id: Uuid,
    request: CreateSubmissionRequest,
    max_length: usize,
    now: DateTime<Utc>,
) -> Result<Submission, SubmissionError> {
    let unit_id = data
        .assignments
        .iter()
        .find(|a| a.id == assignment_id && a.is_active)
        .map(|a| a.unit_id)
        .ok_or(SubmissionError::NotFound)?;
    if !can_open_unit(data, viewer, unit_id, now) {
        return Err(SubmissionError::NotFound);
    }

    let content = check_content(&request.content, max_length)?.to_string();
    let submission = Submission {
        id: Uuid::now_v7(),
        user_id: viewer.user_id,
        assignment_id,
        content,
        file_url: request.file_url.filter(|url| !url.trim().is_empty()),
        status: SubmissionStatus::Pending,
        assigned_to: None,
        submitted_at: now,
    };
    data.submissions.push(submission.clone());
    tracing::info!(submission_id = %submission.id, "Submission received");
    Ok(submission)
}

/// The viewer's own submissions, newest first.
pub fn my_submissions(data: &StoreData, viewer: &Viewer) -> Vec<SubmissionDetails> {
    newest_first(data.submissions.iter().filter(|s| s.user_id == viewer.user_id))
        .into_iter()
        .map(|s| details(data, s))
        .collect()
}

/// The viewer's latest submission for one assignment.
pub fn my_submission_for_assignment(
    data: &StoreData,
    viewer: &Viewer,
    assignment_id: Uuid,
) -> Option<SubmissionDetails> {
    newest_first(
        data.submissions
            .iter()
            .filter(|s| s.user_id == viewer.user_id && s.assignment_id == assignment_id),
    )
    .first()
    .map(|s| details(data, s))
}

// ============================================================================
// Reviewer Side
// ============================================================================

/// All submissions, newest first, optionally filtered by status.
pub fn list_submissions(
    data: &StoreData,
    actor: &Viewer,
    status: Option<SubmissionStatus>,
) -> Result<Vec<SubmissionDetails>, SubmissionError> {
    require_reviewer(actor)?;
    Ok(newest_first(
        data.submissions
            .iter()
            .filter(|s| status.is_none_or(|wanted| s.status == wanted)),
    )
    .into_iter()
    .map(|s| details(data, s))
    .collect())
}

pub fn submission_by_id(
    data: &StoreData,
    actor: &Viewer,
    submission_id: Uuid,
) -> Result<SubmissionDetails, SubmissionError> {
    require_reviewer(actor)?;
    data.submissions
        .iter()
        .find(|s| s.id == submission_id)
        .map(|s| details(data, s))
        .ok_or(SubmissionError::NotFound)
}

/// Move a submission through review. Without an explicit assignee, taking a
/// submission into review assigns it to the acting reviewer.
#[tracing::instrument(skip(data))]
pub fn update_status(
    data: &mut StoreData,
    actor: &Viewer,
    submission_id: Uuid,
    status: SubmissionStatus,
    assigned_to: Option<Uuid>,
) -> Result<Submission, SubmissionError> {
    require_reviewer(actor)?;
    let submission = data
        .submissions
        .iter_mut()
        .find(|s| s.id == submission_id)
        .ok_or(SubmissionError::NotFound)?;

    submission.status = status;
    match (assigned_to, status) {
        (Some(reviewer), _) => submission.assigned_to = Some(reviewer),
        (None, SubmissionStatus::InReview) => submission.assigned_to = Some(actor.user_id),
        (None, _) => {}
    }
    Ok(submission.clone())
}

/// Store reviewer feedback and mark the submission reviewed.
#[tracing::instrument(skip(data, request))]
pub fn add_feedback(
    data: &mut StoreData,
    actor: &Viewer,
    submission_id: Uuid,
    request: CreateFeedbackRequest,
    max_length: usize,
    now: DateTime<Utc>,
) -> Result<Feedback, SubmissionError> {
    require_reviewer(actor)?;
    let content = check_content(&request.content, max_length)?.to_string();

    let submission = data
        .submissions
        .iter_mut()
        .find(|s| s.id == submission_id)
        .ok_or(SubmissionError::NotFound)?;
    submission.status = SubmissionStatus::Reviewed;

    let feedback = Feedback {
        id: Uuid::now_v7(),
        submission_id,
        reviewer_id: actor.user_id,
        content,
        is_ai_generated: request.is_ai_generated,
        created_at: now,
    };
    data.feedback.push(feedback.clone());
    Ok(feedback)
}

pub fn stats(data: &StoreData, actor: &Viewer) -> Result<ReflectionStats, SubmissionError> {
    require_reviewer(actor)?;

    let mut stats = ReflectionStats {
        total_students: data
            .profiles
            .iter()
            .filter(|p| p.role == Role::Participant)
            .count(),
        ..ReflectionStats::default()
    };
    for submission in &data.submissions {
        match submission.status {
            SubmissionStatus::Pending => stats.pending += 1,
            SubmissionStatus::InReview => stats.in_review += 1,
            SubmissionStatus::Reviewed => stats.reviewed += 1,
        }
    }
    Ok(stats)
}
