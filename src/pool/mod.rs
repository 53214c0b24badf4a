//! Connection pool with liveness tracking.
//!
//! # Data Flow
//! ```text
//! get_conn(addr) / dial(addr)
//!     → registry lookup-or-create (short DashMap entry lock)
//!     → tracked.rs (connect-and-verify under the per-address lock)
//!         → Dialer → ReadyCheck (bounded by check_ready_timeout)
//!         → heartbeat.rs spawned for the new handle
//!     → Ready handle or PoolError
//!
//! heartbeat tick
//!     → ReadyCheck outside the per-address lock
//!     → Ready / Idle / Shutdown transition
//!     → alive set updated
//! ```
//!
//! # Design Decisions
//! - One shared handle per address; callers never close it
//! - Registry and alive set are never locked across a dial or readiness wait
//! - Entries are never removed, only moved to Shutdown and redialed on demand
//! - Dropping the last `Pool` handle stops every heartbeat

pub mod error;
mod heartbeat;
mod tracked;

pub use error::{PoolError, PoolResult};
pub use tracked::ConnectionStatus;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::{DialConfig, PoolConfig};
use crate::net::{Connection, Connectivity, DefaultReadyCheck, Dialer, Liveness, ReadyCheck, TcpChannel, TcpDialer};
use crate::observability::metrics;
use tracked::TrackedConnection;

/// Shared pool of liveness-tracked connections, one per address.
///
/// Cloning is cheap; all clones share the same registry.
pub struct Pool<C: Connection> {
    inner: Arc<PoolInner<C>>,
}

impl<C: Connection> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PoolInner<C: Connection> {
    connections: DashMap<String, Arc<TrackedConnection<C>>>,
    ctx: Arc<PoolContext<C>>,
}

impl<C: Connection> Drop for PoolInner<C> {
    fn drop(&mut self) {
        self.ctx.root.cancel();
    }
}

/// Policy and shared state reachable from tracked connections and their
/// heartbeats. Holds no reference back to the registry.
pub(crate) struct PoolContext<C> {
    dialer: Box<dyn Dialer<C>>,
    ready_check: Box<dyn ReadyCheck<C>>,
    timeout: Duration,
    check_ready_timeout: Duration,
    heartbeat_interval: Duration,
    alives: DashMap<String, Instant>,
    root: CancellationToken,
}

impl<C: Connection> PoolContext<C> {
    /// Run the ready check, bounded by `check_ready_timeout`.
    pub(crate) async fn probe(&self, conn: &C) -> Liveness {
        let deadline = Instant::now() + self.check_ready_timeout;
        time::timeout_at(deadline, self.ready_check.check(conn, deadline))
            .await
            .unwrap_or(Liveness::Idle)
    }

    pub(crate) fn conn_ready(&self, address: &str, expires: Instant) {
        self.alives.insert(address.to_string(), expires);
        metrics::record_alive_count(self.alives.len());
    }

    pub(crate) fn conn_unready(&self, address: &str) {
        if self.alives.remove(address).is_some() {
            metrics::record_alive_count(self.alives.len());
        }
    }
}

impl<C: Connection> Pool<C> {
    /// Create a pool with a custom dialer and ready check.
    pub fn new(dialer: impl Dialer<C>, ready_check: impl ReadyCheck<C>, config: PoolConfig) -> Self {
        let ctx = PoolContext {
            dialer: Box::new(dialer),
            ready_check: Box::new(ready_check),
            timeout: config.timeout(),
            check_ready_timeout: config.check_ready_timeout(),
            // A zero period would make the heartbeat ticker panic.
            heartbeat_interval: config.heartbeat_interval().max(Duration::from_millis(1)),
            alives: DashMap::new(),
            root: CancellationToken::new(),
        };

        tracing::info!(
            timeout_ms = config.timeout_ms,
            check_ready_timeout_ms = config.check_ready_timeout_ms,
            heartbeat_interval_ms = config.heartbeat_interval_ms,
            "Connection pool created"
        );

        Self {
            inner: Arc::new(PoolInner {
                connections: DashMap::new(),
                ctx: Arc::new(ctx),
            }),
        }
    }

    /// Return the Ready handle for `address`, connecting if none exists.
    ///
    /// Fails fast with [`PoolError::NotReady`] while an existing connection
    /// is Idle; the heartbeat keeps trying in the background.
    pub async fn get_conn(&self, address: &str) -> PoolResult<Arc<C>> {
        self.get(address, false).await
    }

    /// Close any existing handle for `address` and dial a fresh one.
    pub async fn dial(&self, address: &str) -> PoolResult<Arc<C>> {
        self.get(address, true).await
    }

    async fn get(&self, address: &str, force: bool) -> PoolResult<Arc<C>> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }

        let tracked = Arc::clone(
            self.inner
                .connections
                .entry(address.to_string())
                .or_insert_with(|| {
                    tracing::debug!(address = %address, "Tracking new address");
                    Arc::new(TrackedConnection::new(address, Arc::clone(&self.inner.ctx)))
                })
                .value(),
        );

        tracked.try_connect(force).await
    }

    /// Snapshot of the addresses currently Ready, sorted.
    pub fn alives(&self) -> Vec<String> {
        let mut alives: Vec<String> = self
            .inner
            .ctx
            .alives
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        alives.sort();
        alives
    }

    pub fn is_alive(&self, address: &str) -> bool {
        self.inner.ctx.alives.contains_key(address)
    }

    /// Number of addresses ever requested.
    pub fn tracked_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Inspect the tracked connection for `address`, if it was ever requested.
    pub async fn status(&self, address: &str) -> Option<ConnectionStatus> {
        let tracked = self
            .inner
            .connections
            .get(address)
            .map(|entry| Arc::clone(entry.value()))?;
        Some(tracked.status().await)
    }

    /// Stop every heartbeat and close every handle.
    ///
    /// Calls already in flight finish within their own bounded timeouts;
    /// later calls fail with [`PoolError::Closed`].
    pub async fn shutdown(&self) {
        if self.inner.ctx.root.is_cancelled() {
            return;
        }
        self.inner.ctx.root.cancel();

        let tracked: Vec<_> = self
            .inner
            .connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for conn in &tracked {
            conn.close().await;
        }

        tracing::info!(connections = tracked.len(), "Connection pool shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.ctx.root.is_cancelled()
    }
}

impl<C: Connectivity> Pool<C> {
    /// Create a pool with a custom dialer and the default ready check.
    pub fn with_dialer(dialer: impl Dialer<C>, config: PoolConfig) -> Self {
        Self::new(dialer, DefaultReadyCheck, config)
    }
}

impl Pool<TcpChannel> {
    /// Create a pool over plain TCP channels.
    pub fn tcp(config: PoolConfig, dial: DialConfig) -> Self {
        Self::with_dialer(TcpDialer::new(dial), config)
    }
}
