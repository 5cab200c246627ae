//! Lernportal Server
//!
//! Course delivery backend: hierarchical, expiring content access for
//! members, member management, and the reflection review workflow.

pub mod access;
pub mod api;
pub mod config;
pub mod members;
pub mod store;
pub mod submissions;
