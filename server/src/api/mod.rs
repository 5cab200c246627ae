//! API Router and Application State
//!
//! Central routing configuration and shared state.

pub mod admin;
pub mod error;
pub mod identity;
pub mod learning;

use axum::{
    extract::State,
    http::{header, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::Config, store::Store};

pub use error::ApiError;
pub use identity::{require_identity, AuthUser, USER_ID_HEADER};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Portal records
    pub store: Store,
    /// Server configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Create the main application router.
///
/// Browsers may call the API cross-origin, but never with the identity
/// header: only the identity proxy sets `X-User-Id`, and it must strip any
/// client-supplied value before forwarding.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    let member_routes = Router::new()
        .route("/api/me/courses", get(learning::my_courses))
        .route("/api/me/notices", get(learning::my_notices))
        .route("/api/me/submissions", get(learning::my_submissions))
        .route("/api/courses/{course_id}", get(learning::get_course))
        .route(
            "/api/courses/{course_id}/units/{unit_id}",
            get(learning::get_unit),
        )
        .route(
            "/api/units/{unit_id}/assignment",
            get(learning::get_unit_assignment),
        )
        .route(
            "/api/assignments/{assignment_id}/submission",
            get(learning::my_latest_submission),
        )
        .route(
            "/api/assignments/{assignment_id}/submissions",
            post(learning::create_submission),
        );

    let admin_routes = Router::new()
        .route(
            "/members",
            get(admin::list_members).post(admin::create_member),
        )
        .route("/members/{id}", patch(admin::update_member))
        .route("/members/{id}/status", put(admin::set_member_status))
        .route("/members/{id}/access", get(admin::member_access))
        .route("/grants", put(admin::put_grant))
        .route("/grants/expiration", put(admin::put_grant_expiration))
        .route(
            "/courses/{course_id}/members/{user_id}/access",
            put(admin::put_course_member_access),
        )
        .route(
            "/courses/{course_id}/access",
            get(admin::get_course_access).put(admin::put_course_access_for_all),
        )
        .route(
            "/units/{unit_id}/assignment",
            put(admin::put_assignment).delete(admin::delete_assignment),
        )
        .route("/submissions", get(admin::list_submissions))
        .route("/submissions/stats", get(admin::submission_stats))
        .route("/submissions/{id}", get(admin::get_submission))
        .route(
            "/submissions/{id}/status",
            put(admin::put_submission_status),
        )
        .route("/submissions/{id}/feedback", post(admin::create_feedback));

    // Everything under /api needs an active member
    let protected_routes = Router::new()
        .merge(member_routes)
        .nest("/api/admin", admin_routes)
        .layer(from_fn_with_state(state.clone(), require_identity));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .merge(protected_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // State
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Number of known members
    members: usize,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let members = state.store.read().await.profiles.len();
    Json(HealthResponse {
        status: "ok",
        members,
    })
}
