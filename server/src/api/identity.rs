//! Identity Middleware
//!
//! The identity proxy in front of the server authenticates the caller and
//! forwards the profile id in `X-User-Id`. The header is trusted; the
//! profile must exist and be active.
//!
//! The proxy must drop any `X-User-Id` sent by the client and the server
//! must not be reachable around it. CORS never allows the header, so
//! browser scripts on other origins cannot set it either.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use lms_common::{Profile, Role};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::access::Viewer;

/// Header carrying the authenticated profile id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated member injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
    pub full_name: String,
}

impl AuthUser {
    #[must_use]
    pub const fn viewer(&self) -> Viewer {
        Viewer::new(self.id, self.role)
    }
}

impl From<&Profile> for AuthUser {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            role: profile.role,
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
        }
    }
}

/// Resolve `X-User-Id` to an active profile and inject `AuthUser`.
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id: Uuid = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .ok_or(ApiError::Unauthenticated)?;

    let auth_user = {
        let data = state.store.read().await;
        let profile = data.profile(user_id).ok_or(ApiError::Unauthenticated)?;
        if !profile.is_active {
            tracing::debug!(%user_id, "Rejected deactivated member");
            return Err(ApiError::AccountInactive);
        }
        AuthUser::from(profile)
    };

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}
