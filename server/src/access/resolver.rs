//! Access resolution logic.
//!
//! Decides whether a member may view a course, module, or unit from the
//! member's grants and the course hierarchy. Pure and synchronous; the
//! evaluation instant is always passed in.

use chrono::{DateTime, Utc};
use lms_common::{Course, Grant, GrantAnchor, Module, Role, Unit};
use serde::Serialize;
use uuid::Uuid;

/// Who is asking. Passed explicitly into every view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
    pub role: Role,
}

impl Viewer {
    #[must_use]
    pub const fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Administrators see everything; grants are never consulted for them.
    #[must_use]
    pub const fn bypasses_grants(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Lookup levels for a unit, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeLevel {
    Unit,
    Module,
    Course,
}

/// Order in which levels are consulted. The first level with any matching
/// grant decides; lower levels are never combined with it.
pub const UNIT_PRECEDENCE: [ScopeLevel; 3] =
    [ScopeLevel::Unit, ScopeLevel::Module, ScopeLevel::Course];

impl ScopeLevel {
    /// First grant at this level that applies to `unit`.
    pub fn find<'g>(self, grants: &'g [Grant], unit: &Unit) -> Option<&'g Grant> {
        match self {
            Self::Unit => find_anchored(grants, GrantAnchor::Unit(unit.id)),
            Self::Module => unit
                .module_id
                .and_then(|module_id| find_anchored(grants, GrantAnchor::Module(module_id))),
            Self::Course => find_anchored(grants, GrantAnchor::Course(unit.course_id)),
        }
    }
}

/// First grant with exactly this anchor. Duplicates are a data problem;
/// the earliest one wins.
pub fn find_anchored(grants: &[Grant], anchor: GrantAnchor) -> Option<&Grant> {
    grants.iter().find(|g| g.anchor() == anchor)
}

/// `is_granted` and not past `expires_at`.
pub fn is_grant_active(grant: &Grant, now: DateTime<Utc>) -> bool {
    grant.is_granted && grant.expires_at.is_none_or(|expires_at| expires_at >= now)
}

/// Was granted, but `expires_at` has passed. A revoked grant is never
/// expired, only not granted.
pub fn is_grant_expired(grant: &Grant, now: DateTime<Utc>) -> bool {
    grant.is_granted && grant.expires_at.is_some_and(|expires_at| expires_at < now)
}

/// Access resolver over one member's grants at one instant.
#[derive(Debug, Clone, Copy)]
pub struct AccessResolver<'a> {
    grants: &'a [Grant],
    now: DateTime<Utc>,
}

impl<'a> AccessResolver<'a> {
    /// `grants` must already be scoped to a single member.
    #[must_use]
    pub const fn new(grants: &'a [Grant], now: DateTime<Utc>) -> Self {
        Self { grants, now }
    }

    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// The grant that decides access to `unit`, with the level it came from.
    pub fn effective_grant(&self, unit: &Unit) -> Option<(ScopeLevel, &'a Grant)> {
        UNIT_PRECEDENCE
            .iter()
            .find_map(|level| level.find(self.grants, unit).map(|grant| (*level, grant)))
    }

    /// Most specific grant wins: unit > module > course > denied.
    pub fn has_unit_access(&self, unit: &Unit) -> bool {
        self.effective_grant(unit)
            .is_some_and(|(_, grant)| is_grant_active(grant, self.now))
    }

    /// Any unit of the module is accessible. A module without units falls
    /// back to its own grant, then to the course grant.
    pub fn has_module_access(&self, module: &Module, units: &[Unit]) -> bool {
        let mut module_units = units
            .iter()
            .filter(|u| u.module_id == Some(module.id))
            .peekable();

        if module_units.peek().is_none() {
            return find_anchored(self.grants, GrantAnchor::Module(module.id))
                .or_else(|| find_anchored(self.grants, GrantAnchor::Course(module.course_id)))
                .is_some_and(|grant| is_grant_active(grant, self.now));
        }

        module_units.any(|unit| self.has_unit_access(unit))
    }

    /// Any unit of the course is accessible. A course without units falls
    /// back to its course grant.
    pub fn has_course_access(&self, course: &Course, units: &[Unit]) -> bool {
        let mut course_units = units.iter().filter(|u| u.course_id == course.id).peekable();

        if course_units.peek().is_none() {
            return self
                .course_grant(course.id)
                .is_some_and(|grant| is_grant_active(grant, self.now));
        }

        course_units.any(|unit| self.has_unit_access(unit))
    }

    /// Display hint: the member had access to the course and it lapsed.
    ///
    /// True when the course is not currently accessible and either its
    /// course grant has expired or some grant still references the course
    /// or one of its units. Never true while any route grants access.
    pub fn is_course_expired(&self, course: &Course, units: &[Unit]) -> bool {
        if self.has_course_access(course, units) {
            return false;
        }

        if self
            .course_grant(course.id)
            .is_some_and(|grant| is_grant_expired(grant, self.now))
        {
            return true;
        }

        let course_unit_ids: Vec<Uuid> = units
            .iter()
            .filter(|u| u.course_id == course.id)
            .map(|u| u.id)
            .collect();
        if course_unit_ids.is_empty() {
            return false;
        }

        self.grants.iter().any(|grant| {
            grant.scope.course_id() == Some(course.id)
                || grant
                    .scope
                    .unit_id()
                    .is_some_and(|unit_id| course_unit_ids.contains(&unit_id))
        })
    }

    fn course_grant(&self, course_id: Uuid) -> Option<&'a Grant> {
        find_anchored(self.grants, GrantAnchor::Course(course_id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use lms_common::GrantScope;

    use super::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn grant(scope: GrantScope, is_granted: bool, expires_at: Option<DateTime<Utc>>) -> Grant {
        Grant {
            id: Uuid::new_v4(),
            user_id: id(100),
            scope,
            is_granted,
            expires_at,
            created_at: Utc::now(),
        }
    }

    fn course_grant(course_id: Uuid, is_granted: bool) -> Grant {
        grant(GrantScope::Course { course_id }, is_granted, None)
    }

    fn module_grant(module_id: Uuid, is_granted: bool) -> Grant {
        grant(
            GrantScope::Module {
                course_id: None,
                module_id,
            },
            is_granted,
            None,
        )
    }

    fn unit_grant(unit_id: Uuid, is_granted: bool) -> Grant {
        grant(
            GrantScope::Unit {
                course_id: None,
                module_id: None,
                unit_id,
            },
            is_granted,
            None,
        )
    }

    fn course(n: u128) -> Course {
        Course {
            id: id(n),
            name: format!("Course {n}"),
            description: None,
            thumbnail_url: None,
            category_tags: vec![],
            is_active: true,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    fn module(n: u128, course_id: Uuid) -> Module {
        Module {
            id: id(n),
            course_id,
            name: format!("Module {n}"),
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    fn unit(n: u128, course_id: Uuid, module_id: Option<Uuid>) -> Unit {
        Unit {
            id: id(n),
            course_id,
            module_id,
            name: format!("Unit {n}"),
            sort_order: n as i32,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unit_revocation_beats_course_grant() {
        let c = course(1);
        let u = unit(10, c.id, None);
        let grants = [course_grant(c.id, true), unit_grant(u.id, false)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(!resolver.has_unit_access(&u));
    }

    #[test]
    fn test_unit_grant_beats_course_revocation() {
        let c = course(1);
        let u = unit(10, c.id, None);
        let grants = [course_grant(c.id, false), unit_grant(u.id, true)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(resolver.has_unit_access(&u));
    }

    #[test]
    fn test_module_grant_beats_course_grant() {
        let c = course(1);
        let m = module(5, c.id);
        let u = unit(10, c.id, Some(m.id));
        let grants = [course_grant(c.id, true), module_grant(m.id, false)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(!resolver.has_unit_access(&u));
        assert_eq!(
            resolver.effective_grant(&u).map(|(level, _)| level),
            Some(ScopeLevel::Module)
        );
    }

    #[test]
    fn test_expired_unit_grant_denies_and_reports_expired() {
        let now = Utc::now();
        let c = course(1);
        let u = unit(10, c.id, None);
        let expired = grant(
            GrantScope::Unit {
                course_id: Some(c.id),
                module_id: None,
                unit_id: u.id,
            },
            true,
            Some(now - Duration::days(1)),
        );

        let grants = [expired.clone()];
        let resolver = AccessResolver::new(&grants, now);
        assert!(!resolver.has_unit_access(&u));
        assert!(is_grant_expired(&expired, now));
    }

    #[test]
    fn test_expiry_boundary_is_still_active() {
        let now = Utc::now();
        let g = grant(GrantScope::Course { course_id: id(1) }, true, Some(now));

        assert!(is_grant_active(&g, now));
        assert!(!is_grant_expired(&g, now));
        assert!(is_grant_expired(&g, now + Duration::seconds(1)));
    }

    #[test]
    fn test_revoked_grant_is_not_expired() {
        let now = Utc::now();
        let g = grant(
            GrantScope::Course { course_id: id(1) },
            false,
            Some(now - Duration::days(3)),
        );

        assert!(!is_grant_active(&g, now));
        assert!(!is_grant_expired(&g, now));
    }

    #[test]
    fn test_no_grant_denies() {
        let c = course(1);
        let u = unit(10, c.id, None);
        let grants = [course_grant(id(2), true)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(!resolver.has_unit_access(&u));
        assert!(resolver.effective_grant(&u).is_none());
    }

    #[test]
    fn test_each_level_looks_up_in_isolation() {
        let c = course(1);
        let m = module(5, c.id);
        let u = unit(10, c.id, Some(m.id));
        let grants = [
            course_grant(c.id, true),
            module_grant(m.id, true),
            unit_grant(u.id, true),
        ];

        assert_eq!(
            ScopeLevel::Unit.find(&grants, &u).map(|g| g.anchor()),
            Some(GrantAnchor::Unit(u.id))
        );
        assert_eq!(
            ScopeLevel::Module.find(&grants, &u).map(|g| g.anchor()),
            Some(GrantAnchor::Module(m.id))
        );
        assert_eq!(
            ScopeLevel::Course.find(&grants, &u).map(|g| g.anchor()),
            Some(GrantAnchor::Course(c.id))
        );

        let loose = unit(11, c.id, None);
        assert!(ScopeLevel::Module.find(&grants, &loose).is_none());
    }

    #[test]
    fn test_dangling_module_reference_falls_through_to_course() {
        let c = course(1);
        let u = unit(10, c.id, Some(id(999)));
        let grants = [course_grant(c.id, true)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(resolver.has_unit_access(&u));
    }

    #[test]
    fn test_first_duplicate_grant_wins() {
        let c = course(1);
        let u = unit(10, c.id, None);
        let grants = [unit_grant(u.id, false), unit_grant(u.id, true)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(!resolver.has_unit_access(&u));
    }

    #[test]
    fn test_empty_module_falls_back_to_course_grant() {
        let c = course(1);
        let m = module(5, c.id);
        let grants = [course_grant(c.id, true)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(resolver.has_module_access(&m, &[]));
    }

    #[test]
    fn test_empty_module_prefers_module_grant() {
        let c = course(1);
        let m = module(5, c.id);
        let grants = [course_grant(c.id, true), module_grant(m.id, false)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(!resolver.has_module_access(&m, &[]));
    }

    #[test]
    fn test_module_access_when_any_unit_accessible() {
        let c = course(1);
        let m = module(5, c.id);
        let units = [unit(10, c.id, Some(m.id)), unit(11, c.id, Some(m.id))];
        let grants = [unit_grant(units[1].id, true)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(resolver.has_module_access(&m, &units));
    }

    #[test]
    fn test_module_with_units_ignores_direct_module_fallback() {
        let c = course(1);
        let m = module(5, c.id);
        let units = [unit(10, c.id, Some(m.id))];
        let grants = [module_grant(m.id, true), unit_grant(units[0].id, false)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(!resolver.has_module_access(&m, &units));
    }

    #[test]
    fn test_course_with_no_units_uses_course_grant() {
        let c = course(1);

        let granted = [course_grant(c.id, true)];
        assert!(AccessResolver::new(&granted, Utc::now()).has_course_access(&c, &[]));

        let nothing: [Grant; 0] = [];
        assert!(!AccessResolver::new(&nothing, Utc::now()).has_course_access(&c, &[]));
    }

    #[test]
    fn test_course_grant_opens_every_unit() {
        let c = course(1);
        let units = [unit(10, c.id, None), unit(11, c.id, None)];
        let grants = [course_grant(c.id, true)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(resolver.has_course_access(&c, &units));
        assert!(resolver.has_unit_access(&units[0]));
        assert!(resolver.has_unit_access(&units[1]));
        assert_eq!(units.iter().filter(|u| resolver.has_unit_access(u)).count(), 2);
    }

    #[test]
    fn test_course_expired_when_course_grant_lapsed() {
        let now = Utc::now();
        let c = course(1);
        let units = [unit(10, c.id, None)];
        let grants = [grant(
            GrantScope::Course { course_id: c.id },
            true,
            Some(now - Duration::days(2)),
        )];

        let resolver = AccessResolver::new(&grants, now);
        assert!(!resolver.has_course_access(&c, &units));
        assert!(resolver.is_course_expired(&c, &units));
    }

    #[test]
    fn test_course_expired_when_only_unit_grants_lapsed() {
        let now = Utc::now();
        let c = course(1);
        let units = [unit(10, c.id, None)];
        let grants = [grant(
            GrantScope::Unit {
                course_id: None,
                module_id: None,
                unit_id: units[0].id,
            },
            true,
            Some(now - Duration::hours(1)),
        )];

        let resolver = AccessResolver::new(&grants, now);
        assert!(resolver.is_course_expired(&c, &units));
    }

    #[test]
    fn test_expired_course_grant_with_active_unit_grant_is_not_expired() {
        let now = Utc::now();
        let c = course(1);
        let units = [unit(10, c.id, None), unit(11, c.id, None)];
        let grants = [
            grant(
                GrantScope::Course { course_id: c.id },
                true,
                Some(now - Duration::days(2)),
            ),
            unit_grant(units[1].id, true),
        ];

        let resolver = AccessResolver::new(&grants, now);
        assert!(resolver.has_course_access(&c, &units));
        assert!(!resolver.is_course_expired(&c, &units));
    }

    #[test]
    fn test_never_granted_course_is_not_expired() {
        let c = course(1);
        let units = [unit(10, c.id, None)];
        let grants = [course_grant(id(2), true)];

        let resolver = AccessResolver::new(&grants, Utc::now());
        assert!(!resolver.is_course_expired(&c, &units));
    }

    #[test]
    fn test_resolver_is_idempotent() {
        let now = Utc::now();
        let c = course(1);
        let units = [unit(10, c.id, None), unit(11, c.id, None)];
        let grants = [course_grant(c.id, true), unit_grant(units[0].id, false)];
        let resolver = AccessResolver::new(&grants, now);

        let first: Vec<bool> = units.iter().map(|u| resolver.has_unit_access(u)).collect();
        let second: Vec<bool> = units.iter().map(|u| resolver.has_unit_access(u)).collect();
        assert_eq!(first, second);
        assert_eq!(
            resolver.is_course_expired(&c, &units),
            resolver.is_course_expired(&c, &units)
        );
    }

    #[test]
    fn test_viewer_bypass_is_admin_only() {
        assert!(Viewer::new(id(1), Role::Admin).bypasses_grants());
        assert!(!Viewer::new(id(1), Role::Lecturer).bypasses_grants());
        assert!(!Viewer::new(id(1), Role::Participant).bypasses_grants());
    }
}
