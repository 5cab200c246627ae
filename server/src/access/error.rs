//! Access Management Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lms_common::GrantAnchor;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Only administrators manage grants.
    #[error("Only administrators may manage access")]
    Forbidden,

    /// Course, member, or content missing (or hidden from the caller).
    #[error("Not found")]
    NotFound,

    #[error("No grant for {anchor} on member {user_id}")]
    GrantNotFound { user_id: Uuid, anchor: GrantAnchor },

}

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            Self::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            Self::GrantNotFound { .. } => (StatusCode::NOT_FOUND, "grant_not_found"),
        };
        (
            status,
            Json(serde_json::json!({"error": code, "message": self.to_string()})),
        )
            .into_response()
    }
}
