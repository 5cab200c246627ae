//! Unit Content Types
//!
//! A unit renders as an ordered list of content blocks. The payload of a
//! block is free-form JSON whose shape depends on the block type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::catalog::Ordered;

/// Title shown for an embedded presentation that has none.
pub const DEFAULT_EMBED_TITLE: &str = "Canva Präsentation";

/// Kind of content block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentBlockType {
    /// Embedded Canva presentation. The embed URL is never sent to members.
    CanvaEmbed,
    File,
    Text,
    Link,
}

/// One block of unit content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: Uuid,
    pub unit_id: Uuid,
    #[serde(rename = "type")]
    pub block_type: ContentBlockType,
    #[serde(default)]
    pub content: Value,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl ContentBlock {
    /// Copy of the block that is safe to hand to a member.
    ///
    /// Embedded presentations keep only their title; every other type is
    /// returned as stored.
    #[must_use]
    pub fn redacted(&self) -> Self {
        match self.block_type {
            ContentBlockType::CanvaEmbed => {
                let title = self
                    .content
                    .get("title")
                    .and_then(Value::as_str)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(DEFAULT_EMBED_TITLE);
                Self {
                    content: json!({ "title": title }),
                    ..self.clone()
                }
            }
            ContentBlockType::File | ContentBlockType::Text | ContentBlockType::Link => self.clone(),
        }
    }
}

impl Ordered for ContentBlock {
    fn id(&self) -> Uuid {
        self.id
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }
}
