//! Reflection Request and Response Types

use lms_common::{Assignment, Feedback, Profile, Submission, SubmissionStatus, Unit};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertAssignmentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
}

/// Length limits are checked against the configured maximum instead of a
/// derive attribute.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    pub content: String,
    #[validate(url(message = "Invalid file URL"))]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: SubmissionStatus,
    /// Reviewer to hand the submission to.
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFeedbackRequest {
    #[validate(length(min = 1, max = 20000, message = "Feedback must be 1-20000 characters"))]
    pub content: String,
    #[serde(default)]
    pub is_ai_generated: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionFilter {
    pub status: Option<SubmissionStatus>,
}

// ============================================================================
// Response Types
// ============================================================================

/// Public slice of a profile shown next to submissions and feedback.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PersonSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

impl From<&Profile> for PersonSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            full_name: profile.full_name.clone(),
            email: profile.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackWithReviewer {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub reviewer: Option<PersonSummary>,
}

/// Submission joined with its author, assignment, unit and feedback.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionDetails {
    #[serde(flatten)]
    pub submission: Submission,
    pub user: Option<PersonSummary>,
    pub assignment: Option<Assignment>,
    pub unit: Option<Unit>,
    pub feedback: Vec<FeedbackWithReviewer>,
}

/// Counters for the review dashboard.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ReflectionStats {
    pub pending: usize,
    pub in_review: usize,
    pub reviewed: usize,
    pub total_students: usize,
}
