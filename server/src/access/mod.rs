//! Content access.
//!
//! Hierarchical grant model: a grant on a unit beats one on its module,
//! which beats one on its course. No grant means no access.
//! - `resolver`: yes/no decisions for one member at one instant
//! - `views`: dashboard, course viewer and unit navigation projections
//! - `management`: administrator grant writes

pub mod error;
pub mod management;
pub mod resolver;
pub mod types;
pub mod views;

pub use error::AccessError;
pub use management::{
    course_level_grants, require_grant_admin, set_course_access_for_all, set_course_level_access,
    set_grant, update_grant_expiration, ExpiryUpdate, GrantChange, GrantWrite,
};
pub use resolver::{
    find_anchored, is_grant_active, is_grant_expired, AccessResolver, ScopeLevel, Viewer,
    UNIT_PRECEDENCE,
};
pub use types::{
    AccessNotices, BulkAccessResult, CourseAccessForAllRequest, CourseMemberAccessRequest,
    ExpiringNotice, SetGrantRequest, UpdateExpirationRequest,
};
pub use views::{
    accessible_courses, accessible_courses_with_counts, course_with_access, expired_course_names,
    expiring_grants, unit_navigation, AccessSnapshot, CourseWithAccess, CourseWithCounts,
    ModuleWithAccess, UnitNavigation, UnitWithAccess,
};
