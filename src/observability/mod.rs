//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pool transitions and dials produce:
//!     → tracing events (address, generation, retry fields)
//!     → metrics.rs (counters, alive-set gauge)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
