//! Managed connection pool with liveness tracking.
//!
//! One shared handle per `host:port` address, dialed lazily, verified with
//! a bounded readiness check and kept honest by a background heartbeat that
//! promotes, demotes or abandons it.

pub mod config;
pub mod net;
pub mod observability;
pub mod pool;
pub mod resilience;

pub use config::{Config, DialConfig, PoolConfig};
pub use net::{Connection, Connectivity, ConnectivityState, DialError, Dialer, Liveness, ReadyCheck};
pub use pool::{ConnectionStatus, Pool, PoolError, PoolResult};
