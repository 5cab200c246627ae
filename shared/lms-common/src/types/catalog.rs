//! Course Hierarchy Types
//!
//! Course → Module → Unit. A unit always belongs to a course and may
//! belong to one module of that course.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub category_tags: Vec<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// A module inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// A unit of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    pub course_id: Uuid,
    #[serde(default)]
    pub module_id: Option<Uuid>,
    pub name: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Records with a configured display order.
pub trait Ordered {
    fn id(&self) -> Uuid;
    fn sort_order(&self) -> i32;
}

impl Ordered for Course {
    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }
}

impl Ordered for Module {
    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }
}

impl Ordered for Unit {
    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }
}

/// Deterministic display order: `sort_order`, ties broken by id.
pub fn display_order<T: Ordered>(a: &T, b: &T) -> Ordering {
    a.sort_order()
        .cmp(&b.sort_order())
        .then_with(|| a.id().cmp(&b.id()))
}

/// Sort records in place by [`display_order`].
pub fn sort_for_display<T: Ordered>(items: &mut [T]) {
    items.sort_by(display_order);
}
