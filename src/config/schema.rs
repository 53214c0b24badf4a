//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Pool-wide liveness policy.
    pub pool: PoolConfig,

    /// Settings for the default TCP dialer.
    pub dial: DialConfig,

    /// Addresses to connect to at startup.
    pub targets: Vec<TargetConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Pool liveness policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// How long a Ready connection stays trusted without a fresh Ready
    /// observation. An Idle connection past this window is shut down.
    pub timeout_ms: u64,

    /// Upper bound for a single readiness check.
    pub check_ready_timeout_ms: u64,

    /// Interval between heartbeat checks.
    pub heartbeat_interval_ms: u64,
}

impl PoolConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn check_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.check_ready_timeout_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 100_000,
            check_ready_timeout_ms: 5_000,
            heartbeat_interval_ms: 20_000,
        }
    }
}

/// TCP dialer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DialConfig {
    /// Timeout for a single connect attempt.
    pub connect_timeout_ms: u64,

    /// Base delay for reconnect backoff.
    pub backoff_base_ms: u64,

    /// Maximum reconnect delay.
    pub backoff_max_ms: u64,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 3_000,
            backoff_base_ms: 100,
            backoff_max_ms: 5_000,
        }
    }
}

/// A remote service to connect to.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TargetConfig {
    /// Identifier used in logs.
    pub name: String,

    pub host: String,

    pub port: u16,
}

impl TargetConfig {
    /// The `host:port` address used as the pool key.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
