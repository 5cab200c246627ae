//! Record Validation Errors

use thiserror::Error;
use uuid::Uuid;

/// Errors raised while turning loose records into typed ones.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Grant has none of `course_id`, `module_id`, `unit_id`.
    #[error("Grant {0} is not anchored to a course, module or unit")]
    UnanchoredGrant(Uuid),

    /// Unknown role string.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Unknown submission status string.
    #[error("Unknown submission status: {0}")]
    UnknownStatus(String),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, Error>;
