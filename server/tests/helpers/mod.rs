//! Reusable test helpers for HTTP integration tests.
//!
//! Provides `TestApp` for sending requests through the full axum router
//! over an in-memory store seeded with a small portal:
//!
//! | Course            | Content                          | Participant grants            |
//! |-------------------|----------------------------------|-------------------------------|
//! | `COURSE_BASICS`   | units `U1`, `U2`, no module      | course granted, no expiry     |
//! | `COURSE_LEAD`     | module `M1` with `V1`, `V2`, `V3`| course granted (expires in 3d), `V2` denied |
//! | `COURSE_LAPSED`   | unit `W1`                        | course granted, expired       |
//! | `COURSE_HIDDEN`   | unit `X1`, course inactive       | course granted                |
//!
//! `V1` carries a text block and an embedded presentation at `CANVA_URL`.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{self, header, Method, Request, Response};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use lms_common::{
    Assignment, ContentBlock, ContentBlockType, Course, Grant, GrantScope, Module, Profile, Role,
    Unit,
};
use lms_server::api::{create_router, AppState, USER_ID_HEADER};
use lms_server::config::Config;
use lms_server::store::{Store, StoreData};
use tower::ServiceExt;
use uuid::Uuid;

// ============================================================================
// Fixture ids
// ============================================================================

pub const ADMIN: Uuid = Uuid::from_u128(0x1);
pub const LECTURER: Uuid = Uuid::from_u128(0x2);
pub const PARTICIPANT: Uuid = Uuid::from_u128(0x3);
pub const NEWCOMER: Uuid = Uuid::from_u128(0x4);
pub const INACTIVE: Uuid = Uuid::from_u128(0x5);

pub const COURSE_BASICS: Uuid = Uuid::from_u128(0x10);
pub const U1: Uuid = Uuid::from_u128(0x11);
pub const U2: Uuid = Uuid::from_u128(0x12);

pub const COURSE_LEAD: Uuid = Uuid::from_u128(0x20);
pub const M1: Uuid = Uuid::from_u128(0x21);
pub const V1: Uuid = Uuid::from_u128(0x22);
pub const V2: Uuid = Uuid::from_u128(0x23);
pub const V3: Uuid = Uuid::from_u128(0x24);

pub const COURSE_LAPSED: Uuid = Uuid::from_u128(0x30);
pub const W1: Uuid = Uuid::from_u128(0x31);

pub const COURSE_HIDDEN: Uuid = Uuid::from_u128(0x40);
pub const X1: Uuid = Uuid::from_u128(0x41);

pub const ASSIGNMENT_V1: Uuid = Uuid::from_u128(0x50);
pub const ASSIGNMENT_V2: Uuid = Uuid::from_u128(0x51);

pub const BLOCK_TEXT_V1: Uuid = Uuid::from_u128(0x60);
pub const BLOCK_EMBED_V1: Uuid = Uuid::from_u128(0x61);

/// Embed URL that must never reach a member.
pub const CANVA_URL: &str = "https://www.canva.com/design/DAFexample/view?embed";

// ============================================================================
// Fixture data
// ============================================================================

fn profile(id: Uuid, role: Role, email: &str, is_active: bool, age_days: i64) -> Profile {
    Profile {
        id,
        email: email.into(),
        full_name: email.split('@').next().unwrap_or(email).into(),
        role,
        is_active,
        created_at: Utc::now() - Duration::days(age_days),
    }
}

fn course(id: Uuid, name: &str, sort_order: i32, is_active: bool) -> Course {
    Course {
        id,
        name: name.into(),
        description: None,
        thumbnail_url: None,
        category_tags: vec![],
        is_active,
        sort_order,
        created_at: Utc::now(),
    }
}

fn unit(id: Uuid, course_id: Uuid, module_id: Option<Uuid>, name: &str, sort_order: i32) -> Unit {
    Unit {
        id,
        course_id,
        module_id,
        name: name.into(),
        sort_order,
        created_at: Utc::now(),
    }
}

fn grant(user_id: Uuid, scope: GrantScope, is_granted: bool, expires_in: Option<Duration>) -> Grant {
    Grant {
        id: Uuid::new_v4(),
        user_id,
        scope,
        is_granted,
        expires_at: expires_in.map(|d| Utc::now() + d),
        created_at: Utc::now(),
    }
}

fn block(id: Uuid, unit_id: Uuid, block_type: ContentBlockType, content: serde_json::Value, sort_order: i32) -> ContentBlock {
    ContentBlock {
        id,
        unit_id,
        block_type,
        content,
        sort_order,
        created_at: Utc::now(),
    }
}

fn assignment(id: Uuid, unit_id: Uuid, title: &str) -> Assignment {
    Assignment {
        id,
        unit_id,
        title: title.into(),
        description: None,
        order_index: 0,
        is_active: true,
        created_at: Utc::now(),
    }
}

/// The seeded portal described in the module docs.
pub fn fixture() -> StoreData {
    StoreData {
        profiles: vec![
            profile(ADMIN, Role::Admin, "admin@example.org", true, 40),
            profile(LECTURER, Role::Lecturer, "dozent@example.org", true, 30),
            profile(PARTICIPANT, Role::Participant, "sam@example.org", true, 20),
            profile(NEWCOMER, Role::Participant, "nora@example.org", true, 10),
            profile(INACTIVE, Role::Participant, "ina@example.org", false, 5),
        ],
        courses: vec![
            course(COURSE_BASICS, "Coaching Grundlagen", 0, true),
            course(COURSE_LEAD, "Fuehrung", 1, true),
            course(COURSE_LAPSED, "Abgelaufen", 2, true),
            course(COURSE_HIDDEN, "Entwurf", 3, false),
        ],
        modules: vec![Module {
            id: M1,
            course_id: COURSE_LEAD,
            name: "Modul 1".into(),
            sort_order: 0,
            created_at: Utc::now(),
        }],
        units: vec![
            unit(U1, COURSE_BASICS, None, "U1", 0),
            unit(U2, COURSE_BASICS, None, "U2", 1),
            unit(V1, COURSE_LEAD, Some(M1), "V1", 0),
            unit(V2, COURSE_LEAD, Some(M1), "V2", 1),
            unit(V3, COURSE_LEAD, Some(M1), "V3", 2),
            unit(W1, COURSE_LAPSED, None, "W1", 0),
            unit(X1, COURSE_HIDDEN, None, "X1", 0),
        ],
        content_blocks: vec![
            block(
                BLOCK_EMBED_V1,
                V1,
                ContentBlockType::CanvaEmbed,
                serde_json::json!({"url": CANVA_URL, "title": "Einstieg"}),
                1,
            ),
            block(
                BLOCK_TEXT_V1,
                V1,
                ContentBlockType::Text,
                serde_json::json!({"html": "<p>Willkommen</p>"}),
                0,
            ),
        ],
        grants: vec![
            grant(
                PARTICIPANT,
                GrantScope::Course {
                    course_id: COURSE_BASICS,
                },
                true,
                None,
            ),
            grant(
                PARTICIPANT,
                GrantScope::Course {
                    course_id: COURSE_LEAD,
                },
                true,
                Some(Duration::days(3)),
            ),
            grant(
                PARTICIPANT,
                GrantScope::Unit {
                    course_id: Some(COURSE_LEAD),
                    module_id: Some(M1),
                    unit_id: V2,
                },
                false,
                None,
            ),
            grant(
                PARTICIPANT,
                GrantScope::Course {
                    course_id: COURSE_LAPSED,
                },
                true,
                Some(-Duration::days(1)),
            ),
            grant(
                PARTICIPANT,
                GrantScope::Course {
                    course_id: COURSE_HIDDEN,
                },
                true,
                None,
            ),
        ],
        assignments: vec![
            assignment(ASSIGNMENT_V1, V1, "Reflexion V1"),
            assignment(ASSIGNMENT_V2, V2, "Reflexion V2"),
        ],
        ..StoreData::default()
    }
}

// ============================================================================
// Test App
// ============================================================================

/// A test application wrapping the full axum router.
pub struct TestApp {
    pub router: Router,
    pub store: Store,
    pub config: Arc<Config>,
}

impl TestApp {
    /// Create a new test app over the standard fixture.
    pub fn new() -> Self {
        Self::with_data(fixture(), Config::default_for_test())
    }

    /// Create a test app with custom data and config.
    pub fn with_data(data: StoreData, config: Config) -> Self {
        let store = Store::new(data);
        let state = AppState::new(store.clone(), config.clone());
        Self {
            router: create_router(state),
            store,
            config: Arc::new(config),
        }
    }

    /// Build an HTTP request with the given method and URI.
    pub fn request(method: Method, uri: &str) -> http::request::Builder {
        Request::builder().method(method).uri(uri)
    }

    /// Send a request through the router via `tower::ServiceExt::oneshot`.
    pub async fn oneshot(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot request failed")
    }

    /// `GET` as the given member.
    pub async fn get_as(&self, user_id: Uuid, uri: &str) -> Response<Body> {
        let request = Self::request(Method::GET, uri)
            .header(USER_ID_HEADER, user_id.to_string())
            .body(Body::empty())
            .expect("Failed to build request");
        self.oneshot(request).await
    }

    /// Send a JSON body as the given member.
    pub async fn send_as(
        &self,
        method: Method,
        user_id: Uuid,
        uri: &str,
        body: &serde_json::Value,
    ) -> Response<Body> {
        let request = Self::request(method, uri)
            .header(USER_ID_HEADER, user_id.to_string())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("Failed to build request");
        self.oneshot(request).await
    }

    /// Body-less request as the given member.
    pub async fn empty_as(&self, method: Method, user_id: Uuid, uri: &str) -> Response<Body> {
        let request = Self::request(method, uri)
            .header(USER_ID_HEADER, user_id.to_string())
            .body(Body::empty())
            .expect("Failed to build request");
        self.oneshot(request).await
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_to_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to collect response body")
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        let preview = String::from_utf8_lossy(&bytes);
        panic!("Failed to parse response as JSON: {e}\nBody: {preview}")
    })
}

/// Collect ids from a JSON array of objects.
pub fn ids(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .expect("expected a JSON array")
        .iter()
        .map(|item| item["id"].as_str().expect("missing id").to_string())
        .collect()
}
