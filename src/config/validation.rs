//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (durations > 0, ports valid)
//! - Detect duplicate targets
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::Config;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("pool.check_ready_timeout_ms ({check_ms}) exceeds pool.timeout_ms ({timeout_ms})")]
    CheckLongerThanTimeout { check_ms: u64, timeout_ms: u64 },

    #[error("dial.backoff_max_ms ({max_ms}) is below dial.backoff_base_ms ({base_ms})")]
    BackoffRange { base_ms: u64, max_ms: u64 },

    #[error("target '{name}' has an empty host")]
    EmptyHost { name: String },

    #[error("target '{name}' has port 0")]
    ZeroPort { name: String },

    #[error("duplicate target name '{0}'")]
    DuplicateTarget(String),
}

pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let pool = &config.pool;
    for (field, value) in [
        ("pool.timeout_ms", pool.timeout_ms),
        ("pool.check_ready_timeout_ms", pool.check_ready_timeout_ms),
        ("pool.heartbeat_interval_ms", pool.heartbeat_interval_ms),
        ("dial.connect_timeout_ms", config.dial.connect_timeout_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if pool.check_ready_timeout_ms > pool.timeout_ms {
        errors.push(ValidationError::CheckLongerThanTimeout {
            check_ms: pool.check_ready_timeout_ms,
            timeout_ms: pool.timeout_ms,
        });
    }

    if config.dial.backoff_max_ms < config.dial.backoff_base_ms {
        errors.push(ValidationError::BackoffRange {
            base_ms: config.dial.backoff_base_ms,
            max_ms: config.dial.backoff_max_ms,
        });
    }

    let mut seen = HashSet::new();
    for target in &config.targets {
        if target.host.trim().is_empty() {
            errors.push(ValidationError::EmptyHost { name: target.name.clone() });
        }
        if target.port == 0 {
            errors.push(ValidationError::ZeroPort { name: target.name.clone() });
        }
        if !seen.insert(target.name.as_str()) {
            errors.push(ValidationError::DuplicateTarget(target.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
