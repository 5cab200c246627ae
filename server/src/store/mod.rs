//! In-memory portal store.
//!
//! Stands in for the hosted database: one consistent snapshot of every
//! table behind a single `RwLock`. Handlers take a read guard to build
//! views and a write guard for mutations, so every request sees a
//! consistent snapshot.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use lms_common::{
    sort_for_display, Assignment, ContentBlock, Course, Feedback, Grant, GrantAnchor, Module, Profile, Role,
    Submission, Unit,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::access::AccessSnapshot;

/// All portal records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreData {
    pub profiles: Vec<Profile>,
    pub courses: Vec<Course>,
    pub modules: Vec<Module>,
    pub units: Vec<Unit>,
    pub content_blocks: Vec<ContentBlock>,
    pub grants: Vec<Grant>,
    pub assignments: Vec<Assignment>,
    pub submissions: Vec<Submission>,
    pub feedback: Vec<Feedback>,
}

impl StoreData {
    /// Put hierarchy lists into display order.
    pub fn normalize(&mut self) {
        sort_for_display(&mut self.courses);
        sort_for_display(&mut self.modules);
        sort_for_display(&mut self.units);
        sort_for_display(&mut self.content_blocks);
    }

    pub fn profile(&self, user_id: Uuid) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == user_id)
    }

    pub fn profile_mut(&mut self, user_id: Uuid) -> Option<&mut Profile> {
        self.profiles.iter_mut().find(|p| p.id == user_id)
    }

    pub fn course(&self, course_id: Uuid) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == course_id)
    }

    pub fn module(&self, module_id: Uuid) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    pub fn unit(&self, unit_id: Uuid) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == unit_id)
    }

    /// Course owning the anchored content, `None` if the content is unknown.
    pub fn anchor_course(&self, anchor: GrantAnchor) -> Option<Uuid> {
        match anchor {
            GrantAnchor::Course(id) => self.course(id).map(|c| c.id),
            GrantAnchor::Module(id) => self.module(id).map(|m| m.course_id),
            GrantAnchor::Unit(id) => self.unit(id).map(|u| u.course_id),
        }
    }

    /// Display name of the anchored content.
    pub fn anchor_name(&self, anchor: GrantAnchor) -> Option<&str> {
        match anchor {
            GrantAnchor::Course(id) => self.course(id).map(|c| c.name.as_str()),
            GrantAnchor::Module(id) => self.module(id).map(|m| m.name.as_str()),
            GrantAnchor::Unit(id) => self.unit(id).map(|u| u.name.as_str()),
        }
    }

    /// Grants of one member, in stored order.
    pub fn grants_for(&self, user_id: Uuid) -> Vec<Grant> {
        self.grants
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Ids of every participant profile.
    pub fn participant_ids(&self) -> Vec<Uuid> {
        self.profiles
            .iter()
            .filter(|p| p.role == Role::Participant)
            .map(|p| p.id)
            .collect()
    }

    /// What the resolver needs for one member: their grants and the active
    /// course hierarchy with its content.
    pub fn access_snapshot(&self, user_id: Uuid) -> AccessSnapshot {
        let courses: Vec<Course> = self.courses.iter().filter(|c| c.is_active).cloned().collect();
        let modules = self
            .modules
            .iter()
            .filter(|m| courses.iter().any(|c| c.id == m.course_id))
            .cloned()
            .collect();
        let units: Vec<Unit> = self
            .units
            .iter()
            .filter(|u| courses.iter().any(|c| c.id == u.course_id))
            .cloned()
            .collect();
        let content_blocks = self
            .content_blocks
            .iter()
            .filter(|b| units.iter().any(|u| u.id == b.unit_id))
            .cloned()
            .collect();

        AccessSnapshot {
            grants: self.grants_for(user_id),
            courses,
            modules,
            units,
            content_blocks,
        }
    }
}

/// Shared handle to the store.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<StoreData>>,
}

impl Store {
    #[must_use]
    pub fn new(mut data: StoreData) -> Self {
        data.normalize();
        Self {
            inner: Arc::new(RwLock::new(data)),
        }
    }

    /// Load a JSON seed file.
    pub async fn from_seed_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        let data: StoreData = serde_json::from_slice(&raw)
            .with_context(|| format!("invalid seed file {}", path.display()))?;

        tracing::info!(
            profiles = data.profiles.len(),
            courses = data.courses.len(),
            units = data.units.len(),
            grants = data.grants.len(),
            "Seed loaded"
        );
        Ok(Self::new(data))
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, StoreData> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, StoreData> {
        self.inner.write().await
    }
}
