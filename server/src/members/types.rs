//! Member Request and Response Types

use chrono::{DateTime, Utc};
use lms_common::{Course, Grant, Module, Profile, Role, Unit};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// ============================================================================
// Request Types
// ============================================================================

/// Course granted at creation time.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseAssignment {
    pub course_id: Uuid,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[validate(email(message = "Invalid e-mail address"))]
    pub email: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub full_name: String,
    /// Ignored for lecturers, who may only create participants.
    pub role: Option<Role>,
    #[serde(default)]
    pub course_assignments: Vec<CourseAssignment>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    #[validate(email(message = "Invalid e-mail address"))]
    pub email: String,
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub full_name: String,
    /// Applied only when an administrator asks.
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetMemberStatusRequest {
    pub is_active: bool,
}

// ============================================================================
// Response Types
// ============================================================================

/// Everything the access editor needs for one member.
#[derive(Debug, Clone, Serialize)]
pub struct MemberAccessOverview {
    pub member: Profile,
    pub grants: Vec<Grant>,
    pub courses: Vec<Course>,
    pub modules: Vec<Module>,
    pub units: Vec<Unit>,
}
