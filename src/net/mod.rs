//! Transport capabilities the pool is built on.
//!
//! # Data Flow
//! ```text
//! Pool needs a connection for "host:port"
//!     → dialer.rs (Dialer opens a handle)
//!     → connection.rs (handle + connectivity states)
//!     → ready.rs (ReadyCheck settles on Ready / Idle / Shutdown)
//!
//! Default stack:
//!     tcp.rs (TcpDialer → TcpChannel) + DefaultReadyCheck
//! ```
//!
//! # Design Decisions
//! - Dialer and ReadyCheck are single-method traits, swappable per pool
//! - Readiness is always bounded by a deadline supplied by the pool
//! - Handles close idempotently; the pool owns the close

pub mod connection;
pub mod dialer;
pub mod ready;
pub mod tcp;

pub use connection::{Connection, Connectivity, ConnectivityState, Liveness};
pub use dialer::{dial_fn, DialError, DialFn, Dialer};
pub use ready::{DefaultReadyCheck, ReadyCheck};
pub use tcp::{TcpChannel, TcpDialer};
