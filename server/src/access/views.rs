//! Read-only projections for the member portal.
//!
//! Every view takes the viewer explicitly. Administrators skip grant
//! evaluation and see all content as accessible.

use chrono::{DateTime, Duration, Utc};
use lms_common::{display_order, ContentBlock, Course, Grant, Module, Unit};
use serde::Serialize;
use uuid::Uuid;

use super::resolver::{is_grant_active, AccessResolver, Viewer};

/// One member's grants plus the active course hierarchy.
///
/// Built per request by the caller. Courses are expected to be the active
/// ones only; lists are kept in display order.
#[derive(Debug, Clone, Default)]
pub struct AccessSnapshot {
    pub grants: Vec<Grant>,
    pub courses: Vec<Course>,
    pub modules: Vec<Module>,
    pub units: Vec<Unit>,
    /// Content blocks of the units above.
    pub content_blocks: Vec<ContentBlock>,
}

impl AccessSnapshot {
    #[must_use]
    pub fn resolver(&self, now: DateTime<Utc>) -> AccessResolver<'_> {
        AccessResolver::new(&self.grants, now)
    }

    pub fn course(&self, course_id: Uuid) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == course_id)
    }

    /// Units of a course in display order.
    pub fn course_units(&self, course_id: Uuid) -> Vec<&Unit> {
        let mut units: Vec<&Unit> = self.units.iter().filter(|u| u.course_id == course_id).collect();
        units.sort_by(|a, b| display_order(*a, *b));
        units
    }

    /// Modules of a course in display order.
    pub fn course_modules(&self, course_id: Uuid) -> Vec<&Module> {
        let mut modules: Vec<&Module> = self
            .modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .collect();
        modules.sort_by(|a, b| display_order(*a, *b));
        modules
    }

    /// Member-safe content blocks of a unit in display order.
    pub fn unit_blocks(&self, unit_id: Uuid) -> Vec<ContentBlock> {
        let mut blocks: Vec<&ContentBlock> = self
            .content_blocks
            .iter()
            .filter(|b| b.unit_id == unit_id)
            .collect();
        blocks.sort_by(|a, b| display_order(*a, *b));
        blocks.into_iter().map(ContentBlock::redacted).collect()
    }
}

/// Dashboard row.
#[derive(Debug, Clone, Serialize)]
pub struct CourseWithCounts {
    #[serde(flatten)]
    pub course: Course,
    pub unit_count: usize,
    pub accessible_unit_count: usize,
    pub is_expired: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleWithAccess {
    #[serde(flatten)]
    pub module: Module,
    pub has_access: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitWithAccess {
    #[serde(flatten)]
    pub unit: Unit,
    pub has_access: bool,
}

/// Course viewer payload.
#[derive(Debug, Clone, Serialize)]
pub struct CourseWithAccess {
    pub course: Course,
    pub modules: Vec<ModuleWithAccess>,
    pub units: Vec<UnitWithAccess>,
}

/// Unit viewer payload. Navigation only moves between accessible units.
#[derive(Debug, Clone, Serialize)]
pub struct UnitNavigation {
    pub course: Course,
    pub unit: Unit,
    /// Redacted blocks; embed URLs are withheld.
    pub blocks: Vec<ContentBlock>,
    pub accessible_units: Vec<Unit>,
    pub prev_unit: Option<Unit>,
    pub next_unit: Option<Unit>,
}

/// Courses the viewer can open right now.
pub fn accessible_courses(viewer: &Viewer, snapshot: &AccessSnapshot, now: DateTime<Utc>) -> Vec<Course> {
    if viewer.bypasses_grants() {
        return snapshot.courses.clone();
    }

    let resolver = snapshot.resolver(now);
    snapshot
        .courses
        .iter()
        .filter(|course| resolver.has_course_access(course, &snapshot.units))
        .cloned()
        .collect()
}

/// Dashboard: accessible and lapsed courses with unit counts.
#[tracing::instrument(skip(snapshot), fields(courses = snapshot.courses.len()))]
pub fn accessible_courses_with_counts(
    viewer: &Viewer,
    snapshot: &AccessSnapshot,
    now: DateTime<Utc>,
) -> Vec<CourseWithCounts> {
    let is_admin = viewer.bypasses_grants();
    let resolver = snapshot.resolver(now);

    snapshot
        .courses
        .iter()
        .filter_map(|course| {
            let is_expired = !is_admin && resolver.is_course_expired(course, &snapshot.units);
            if !is_admin && !is_expired && !resolver.has_course_access(course, &snapshot.units) {
                return None;
            }

            let units = snapshot.course_units(course.id);
            let accessible_unit_count = if is_admin {
                units.len()
            } else {
                units.iter().filter(|u| resolver.has_unit_access(u)).count()
            };

            Some(CourseWithCounts {
                course: course.clone(),
                unit_count: units.len(),
                accessible_unit_count,
                is_expired,
            })
        })
        .collect()
}

/// Course detail with per-module and per-unit access flags.
///
/// `None` when the course is missing or the viewer has no access; callers
/// must not distinguish the two.
pub fn course_with_access(
    viewer: &Viewer,
    snapshot: &AccessSnapshot,
    course_id: Uuid,
    now: DateTime<Utc>,
) -> Option<CourseWithAccess> {
    let is_admin = viewer.bypasses_grants();
    let resolver = snapshot.resolver(now);
    let course = snapshot.course(course_id)?;

    if !is_admin && !resolver.has_course_access(course, &snapshot.units) {
        return None;
    }

    let course_units: Vec<Unit> = snapshot.course_units(course_id).into_iter().cloned().collect();

    let modules = snapshot
        .course_modules(course_id)
        .into_iter()
        .map(|module| ModuleWithAccess {
            has_access: is_admin || resolver.has_module_access(module, &course_units),
            module: module.clone(),
        })
        .collect();

    let units = course_units
        .iter()
        .map(|unit| UnitWithAccess {
            has_access: is_admin || resolver.has_unit_access(unit),
            unit: unit.clone(),
        })
        .collect();

    Some(CourseWithAccess {
        course: course.clone(),
        modules,
        units,
    })
}

/// A single unit with its content plus prev/next within the viewer's
/// accessible units.
///
/// `None` when the course or unit is missing, the unit is in another
/// course, or the viewer may not see it.
pub fn unit_navigation(
    viewer: &Viewer,
    snapshot: &AccessSnapshot,
    course_id: Uuid,
    unit_id: Uuid,
    now: DateTime<Utc>,
) -> Option<UnitNavigation> {
    let is_admin = viewer.bypasses_grants();
    let resolver = snapshot.resolver(now);

    let course = snapshot.course(course_id)?;
    let unit = snapshot
        .units
        .iter()
        .find(|u| u.id == unit_id && u.course_id == course_id)?;

    if !is_admin && !resolver.has_unit_access(unit) {
        return None;
    }

    let accessible_units: Vec<Unit> = snapshot
        .course_units(course_id)
        .into_iter()
        .filter(|u| is_admin || resolver.has_unit_access(u))
        .cloned()
        .collect();

    let position = accessible_units.iter().position(|u| u.id == unit_id)?;
    let prev_unit = position
        .checked_sub(1)
        .and_then(|i| accessible_units.get(i))
        .cloned();
    let next_unit = accessible_units.get(position + 1).cloned();

    Some(UnitNavigation {
        course: course.clone(),
        unit: unit.clone(),
        blocks: snapshot.unit_blocks(unit_id),
        accessible_units,
        prev_unit,
        next_unit,
    })
}

/// Active grants that lapse within `window` from `now`, soonest first.
///
/// A window reaching past the representable date range covers every
/// expiring grant.
pub fn expiring_grants(grants: &[Grant], now: DateTime<Utc>, window: Duration) -> Vec<&Grant> {
    let horizon = now.checked_add_signed(window);
    let mut expiring: Vec<&Grant> = grants
        .iter()
        .filter(|g| is_grant_active(g, now))
        .filter(|g| {
            g.expires_at
                .is_some_and(|expires_at| horizon.is_none_or(|h| expires_at <= h))
        })
        .collect();
    expiring.sort_by_key(|g| g.expires_at);
    expiring
}

/// Names of courses whose access has lapsed, for the expired-access notice.
pub fn expired_course_names(viewer: &Viewer, snapshot: &AccessSnapshot, now: DateTime<Utc>) -> Vec<String> {
    if viewer.bypasses_grants() {
        return Vec::new();
    }

    let resolver = snapshot.resolver(now);
    snapshot
        .courses
        .iter()
        .filter(|course| resolver.is_course_expired(course, &snapshot.units))
        .map(|course| course.name.clone())
        .collect()
}
