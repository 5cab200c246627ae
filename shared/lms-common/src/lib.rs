//! Lernportal Common Library
//!
//! Shared records used by the server and by anything that feeds it
//! snapshots: course hierarchy, access grants, members, and reflection
//! submissions.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
