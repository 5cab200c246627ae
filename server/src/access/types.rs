//! Access Request and Response Types

use chrono::{DateTime, Utc};
use lms_common::GrantAnchor;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::management::ExpiryUpdate;

/// Tells an absent field (`None`) apart from an explicit `null`
/// (`Some(None)`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

const fn expiry_update(field: Option<Option<DateTime<Utc>>>) -> ExpiryUpdate {
    match field {
        None => ExpiryUpdate::Keep,
        Some(expires_at) => ExpiryUpdate::Set(expires_at),
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SetGrantRequest {
    pub user_id: Uuid,
    pub anchor: GrantAnchor,
    pub is_granted: bool,
    /// Omit to keep the current expiry, `null` to clear it.
    #[serde(default, deserialize_with = "present")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl SetGrantRequest {
    #[must_use]
    pub const fn expiry(&self) -> ExpiryUpdate {
        expiry_update(self.expires_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateExpirationRequest {
    pub user_id: Uuid,
    pub anchor: GrantAnchor,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseMemberAccessRequest {
    pub is_granted: bool,
    #[serde(default, deserialize_with = "present")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl CourseMemberAccessRequest {
    #[must_use]
    pub const fn expiry(&self) -> ExpiryUpdate {
        expiry_update(self.expires_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseAccessForAllRequest {
    pub is_granted: bool,
}

// ============================================================================
// Response Types
// ============================================================================

/// One grant about to lapse, named for display.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringNotice {
    pub grant_id: Uuid,
    pub anchor: GrantAnchor,
    pub name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessNotices {
    pub expired_courses: Vec<String>,
    pub expiring: Vec<ExpiringNotice>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BulkAccessResult {
    pub course_id: Uuid,
    pub updated: usize,
}
