//! Per-address connection lifecycle.
//!
//! # States
//! - (none): never dialed successfully
//! - Ready: handle usable, address in the alive set
//! - Idle: handle kept, readiness unconfirmed, heartbeat keeps probing
//! - Shutdown: handle closed, next access redials
//!
//! # State Transitions
//! ```text
//! → Ready:    expires = now + timeout, retry = 0, join alive set
//! → Idle:     retry += 1, leave alive set
//! → Shutdown: close handle, cancel heartbeat, leave alive set
//! Idle observed after `expires` → Shutdown
//! ```
//!
//! Every (re)dial bumps `generation`. Heartbeats carry the generation they
//! were spawned for and drop results that belong to a replaced handle.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::net::{Connection, Liveness};
use crate::observability::metrics;
use crate::pool::error::{PoolError, PoolResult};
use crate::pool::heartbeat;
use crate::pool::PoolContext;

/// Point-in-time view of one tracked connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub address: String,
    /// `None` until the first successful dial.
    pub state: Option<Liveness>,
    /// Consecutive Idle observations since the last Ready.
    pub retry: u32,
    /// Liveness deadline of the current handle.
    pub expires: Option<Instant>,
    /// Number of successful dials so far.
    pub generation: u64,
    pub has_handle: bool,
}

#[derive(Debug, Clone, Copy)]
enum ShutdownCause {
    /// Superseded by a fresh dial.
    Replaced,
    /// The ready check reported the transport shut down.
    Transport,
    /// Still Idle after the liveness deadline.
    Expired,
    /// The pool itself is shutting down.
    PoolClosed,
}

struct TrackedState<C> {
    conn: Option<Arc<C>>,
    state: Option<Liveness>,
    expires: Option<Instant>,
    retry: u32,
    heartbeat: Option<CancellationToken>,
    generation: u64,
}

pub(crate) struct TrackedConnection<C: Connection> {
    address: String,
    ctx: Arc<PoolContext<C>>,
    inner: Mutex<TrackedState<C>>,
}

impl<C: Connection> TrackedConnection<C> {
    pub(crate) fn new(address: &str, ctx: Arc<PoolContext<C>>) -> Self {
        Self {
            address: address.to_string(),
            ctx,
            inner: Mutex::new(TrackedState {
                conn: None,
                state: None,
                expires: None,
                retry: 0,
                heartbeat: None,
                generation: 0,
            }),
        }
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn heartbeat_interval(&self) -> std::time::Duration {
        self.ctx.heartbeat_interval
    }

    /// Connect-and-verify. Without `force`, a Ready handle is returned as is
    /// and an Idle one fails fast; anything else is (re)dialed.
    pub(crate) async fn try_connect(self: &Arc<Self>, force: bool) -> PoolResult<Arc<C>> {
        let mut st = self.inner.lock().await;
        if self.ctx.root.is_cancelled() {
            return Err(PoolError::Closed);
        }

        if !force {
            if let Some(conn) = &st.conn {
                match st.state {
                    Some(Liveness::Ready) => return Ok(Arc::clone(conn)),
                    Some(Liveness::Idle) => return Err(self.not_ready()),
                    _ => {}
                }
            }
        }

        if st.conn.is_some() {
            self.shutdown(&mut st, ShutdownCause::Replaced);
        }

        let conn = match self.ctx.dialer.dial(&self.address).await {
            Ok(conn) => Arc::new(conn),
            Err(source) => {
                metrics::record_dial(&self.address, false);
                tracing::warn!(address = %self.address, error = %source, "Dial failed");
                return Err(PoolError::Dial {
                    address: self.address.clone(),
                    source,
                });
            }
        };
        metrics::record_dial(&self.address, true);

        if self.ctx.root.is_cancelled() {
            conn.close();
            return Err(PoolError::Closed);
        }

        st.generation += 1;
        st.conn = Some(Arc::clone(&conn));
        st.expires = Some(Instant::now() + self.ctx.timeout);
        st.retry = 0;

        let token = self.ctx.root.child_token();
        st.heartbeat = Some(token.clone());
        heartbeat::spawn(Arc::clone(self), token, st.generation);

        tracing::debug!(
            address = %self.address,
            generation = st.generation,
            force,
            "Dialed, waiting for readiness"
        );

        let observed = self.ctx.probe(&conn).await;
        self.apply(&mut st, observed);

        if st.state == Some(Liveness::Ready) {
            Ok(conn)
        } else {
            Err(self.not_ready())
        }
    }

    /// One heartbeat check for the handle of `generation`.
    ///
    /// The ready check runs without holding the lock so callers of a Ready
    /// connection never wait on it. Returns `false` once the heartbeat
    /// should stop.
    pub(crate) async fn heartbeat_tick(&self, generation: u64) -> bool {
        let conn = {
            let st = self.inner.lock().await;
            if st.generation != generation {
                return false;
            }
            match &st.conn {
                Some(conn) => Arc::clone(conn),
                None => return false,
            }
        };

        let observed = self.ctx.probe(&conn).await;

        let mut st = self.inner.lock().await;
        if st.generation != generation || st.conn.is_none() {
            return false;
        }
        self.apply(&mut st, observed);
        st.state != Some(Liveness::Shutdown)
    }

    /// Heartbeat token cancelled. Only acts when the pool is closing: a
    /// replaced or already shut down handle has nothing left to close.
    pub(crate) async fn heartbeat_cancelled(&self, generation: u64) {
        let mut st = self.inner.lock().await;
        if st.generation == generation && st.conn.is_some() {
            self.shutdown(&mut st, ShutdownCause::PoolClosed);
        }
    }

    /// Close the current handle as part of pool shutdown.
    pub(crate) async fn close(&self) {
        let mut st = self.inner.lock().await;
        if st.conn.is_some() {
            self.shutdown(&mut st, ShutdownCause::PoolClosed);
        }
    }

    pub(crate) async fn status(&self) -> ConnectionStatus {
        let st = self.inner.lock().await;
        ConnectionStatus {
            address: self.address.clone(),
            state: st.state,
            retry: st.retry,
            expires: st.expires,
            generation: st.generation,
            has_handle: st.conn.is_some(),
        }
    }

    fn apply(&self, st: &mut TrackedState<C>, observed: Liveness) {
        match observed {
            Liveness::Ready => self.ready(st),
            Liveness::Shutdown => self.shutdown(st, ShutdownCause::Transport),
            Liveness::Idle if expired(st.expires) => self.shutdown(st, ShutdownCause::Expired),
            Liveness::Idle => self.idle(st),
        }
    }

    fn ready(&self, st: &mut TrackedState<C>) {
        let expires = Instant::now() + self.ctx.timeout;
        let previous = st.state.replace(Liveness::Ready);
        st.expires = Some(expires);
        st.retry = 0;
        self.ctx.conn_ready(&self.address, expires);

        if previous != Some(Liveness::Ready) {
            metrics::record_transition(&self.address, Liveness::Ready);
            tracing::debug!(address = %self.address, generation = st.generation, "Connection ready");
        }
    }

    fn idle(&self, st: &mut TrackedState<C>) {
        let previous = st.state.replace(Liveness::Idle);
        st.retry = st.retry.saturating_add(1);
        self.ctx.conn_unready(&self.address);

        if previous != Some(Liveness::Idle) {
            metrics::record_transition(&self.address, Liveness::Idle);
        }
        tracing::debug!(
            address = %self.address,
            generation = st.generation,
            retry = st.retry,
            "Connection not ready"
        );
    }

    fn shutdown(&self, st: &mut TrackedState<C>, cause: ShutdownCause) {
        st.state = Some(Liveness::Shutdown);
        if let Some(conn) = st.conn.take() {
            conn.close();
        }
        if let Some(token) = st.heartbeat.take() {
            token.cancel();
        }
        self.ctx.conn_unready(&self.address);
        metrics::record_transition(&self.address, Liveness::Shutdown);

        match cause {
            ShutdownCause::Replaced | ShutdownCause::PoolClosed => {
                tracing::debug!(address = %self.address, generation = st.generation, ?cause, "Connection closed");
            }
            ShutdownCause::Transport | ShutdownCause::Expired => {
                tracing::warn!(
                    address = %self.address,
                    generation = st.generation,
                    retry = st.retry,
                    ?cause,
                    "Connection shut down"
                );
            }
        }
    }

    fn not_ready(&self) -> PoolError {
        PoolError::NotReady {
            address: self.address.clone(),
        }
    }
}

fn expired(expires: Option<Instant>) -> bool {
    match expires {
        Some(deadline) => deadline < Instant::now(),
        None => true,
    }
}
