//! Connection handle abstractions and connectivity states.
//!
//! # Responsibilities
//! - Define the opaque handle the pool owns per address
//! - Model the transport's fine-grained connectivity state
//! - Model the pool's coarse liveness state (Ready/Idle/Shutdown)

use async_trait::async_trait;

/// Transport-level connectivity, as reported by a channel.
///
/// Only `Ready` and `Shutdown` are terminal for a readiness check; every
/// other state means the channel is still working towards one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityState {
    /// Not connected and not trying yet.
    Idle,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected and usable.
    Ready,
    /// The last attempt failed, a retry is scheduled.
    TransientFailure,
    /// Closed for good.
    Shutdown,
}

impl ConnectivityState {
    /// Terminal states end a readiness wait.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectivityState::Ready | ConnectivityState::Shutdown)
    }
}

impl std::fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectivityState::Idle => "idle",
            ConnectivityState::Connecting => "connecting",
            ConnectivityState::Ready => "ready",
            ConnectivityState::TransientFailure => "transient_failure",
            ConnectivityState::Shutdown => "shutdown",
        };
        f.write_str(s)
    }
}

/// Liveness of a tracked connection.
///
/// # State Transitions
/// ```text
/// (none) --dial--> Ready | Idle
/// Ready  --check--> Ready | Idle | Shutdown
/// Idle   --check--> Ready | Idle | Shutdown (when liveness expired)
/// Shutdown --next access--> redial
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Liveness {
    /// Usable, listed in the alive set.
    Ready,
    /// Unconfirmed; the handle is kept and the heartbeat keeps probing.
    Idle,
    /// Abandoned; the handle has been closed.
    Shutdown,
}

impl Liveness {
    pub fn as_str(self) -> &'static str {
        match self {
            Liveness::Ready => "ready",
            Liveness::Idle => "idle",
            Liveness::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for Liveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ConnectivityState> for Liveness {
    /// Collapse a transport state; anything non-terminal is `Idle`.
    fn from(state: ConnectivityState) -> Self {
        match state {
            ConnectivityState::Ready => Liveness::Ready,
            ConnectivityState::Shutdown => Liveness::Shutdown,
            _ => Liveness::Idle,
        }
    }
}

/// A transport connection handle owned by the pool.
///
/// The pool shares the handle with callers through an `Arc`, but only the
/// pool ever closes it.
pub trait Connection: Send + Sync + 'static {
    /// Close the underlying transport. Must be idempotent.
    fn close(&self);
}

/// A handle that can report and await connectivity changes.
///
/// Implementing this makes a handle usable with [`DefaultReadyCheck`].
///
/// [`DefaultReadyCheck`]: crate::net::ready::DefaultReadyCheck
#[async_trait]
pub trait Connectivity: Connection {
    /// Current connectivity state.
    fn state(&self) -> ConnectivityState;

    /// Wait until the state differs from `from` and return the new state.
    ///
    /// Callers bound this with their own deadline.
    async fn state_changed(&self, from: ConnectivityState) -> ConnectivityState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ConnectivityState::Ready.is_terminal());
        assert!(ConnectivityState::Shutdown.is_terminal());
        assert!(!ConnectivityState::Connecting.is_terminal());
        assert!(!ConnectivityState::TransientFailure.is_terminal());
        assert!(!ConnectivityState::Idle.is_terminal());
    }

    #[test]
    fn liveness_from_connectivity() {
        assert_eq!(Liveness::from(ConnectivityState::Ready), Liveness::Ready);
        assert_eq!(Liveness::from(ConnectivityState::Shutdown), Liveness::Shutdown);
        assert_eq!(Liveness::from(ConnectivityState::Connecting), Liveness::Idle);
        assert_eq!(Liveness::from(ConnectivityState::TransientFailure), Liveness::Idle);
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(ConnectivityState::TransientFailure.to_string(), "transient_failure");
        assert_eq!(Liveness::Shutdown.to_string(), "shutdown");
    }
}
