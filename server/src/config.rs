//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{ensure, Result};
use chrono::Duration;
use std::env;
use std::path::PathBuf;

/// Longest expiry notice window accepted from the environment.
pub const MAX_EXPIRY_WARNING_DAYS: i64 = 3650;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// JSON seed for the in-memory store (optional, starts empty without)
    pub seed_path: Option<PathBuf>,

    /// Days ahead in which expiring grants are announced (default: 7)
    pub expiry_warning_days: i64,

    /// Maximum characters in a reflection or feedback text (default: 20000)
    pub max_submission_length: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            seed_path: env::var("SEED_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            expiry_warning_days: env::var("EXPIRY_WARNING_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
            max_submission_length: env::var("MAX_SUBMISSION_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20_000),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0..=MAX_EXPIRY_WARNING_DAYS).contains(&self.expiry_warning_days),
            "EXPIRY_WARNING_DAYS must be between 0 and {MAX_EXPIRY_WARNING_DAYS}"
        );
        ensure!(
            self.max_submission_length > 0,
            "MAX_SUBMISSION_LENGTH must be positive"
        );
        Ok(())
    }

    /// Window for the "access expires soon" notice.
    #[must_use]
    pub fn expiry_warning_window(&self) -> Duration {
        Duration::days(self.expiry_warning_days)
    }

    /// Create a default configuration for testing.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            seed_path: None,
            expiry_warning_days: 7,
            max_submission_length: 20_000,
        }
    }
}
