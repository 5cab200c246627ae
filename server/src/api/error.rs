//! API Error Type
//!
//! Wraps the per-area errors so handlers can mix them with `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::access::AccessError;
use crate::members::MemberError;
use crate::submissions::SubmissionError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing or invalid X-User-Id header")]
    Unauthenticated,

    #[error("Account is deactivated")]
    AccountInactive,

    /// Unknown or hidden resource.
    #[error("Not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Member(#[from] MemberError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code) = match self {
            Self::Access(err) => return err.into_response(),
            Self::Member(err) => return err.into_response(),
            Self::Submission(err) => return err.into_response(),
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Self::AccountInactive => (StatusCode::FORBIDDEN, "account_inactive"),
            Self::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
        };
        (
            status,
            Json(serde_json::json!({"error": code, "message": message})),
        )
            .into_response()
    }
}
