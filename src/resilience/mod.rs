//! Resilience helpers shared by transports.
//!
//! # Data Flow
//! ```text
//! Channel loses its connection:
//!     → backoff.rs (jittered exponential delay)
//!     → reconnect attempt
//! ```
//!
//! # Design Decisions
//! - The pool itself never retries dials; transports reconnect on their own
//! - Jittered backoff prevents thundering herd against a recovering host

pub mod backoff;

pub use backoff::Backoff;
