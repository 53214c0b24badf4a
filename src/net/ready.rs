//! Readiness checks.
//!
//! A ready check blocks until a connection reaches a terminal state or the
//! deadline passes. Running out of time is reported as `Idle`, which means
//! "undetermined", not "dead".

use async_trait::async_trait;
use tokio::time::{self, Instant};

use crate::net::connection::{Connectivity, Liveness};

/// Probes a connection of type `C` for liveness.
#[async_trait]
pub trait ReadyCheck<C>: Send + Sync + 'static {
    /// Return `Ready` or `Shutdown` once known, `Idle` if `deadline` passes first.
    async fn check(&self, conn: &C, deadline: Instant) -> Liveness;
}

/// Polls the handle's connectivity until it settles.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultReadyCheck;

#[async_trait]
impl<C: Connectivity> ReadyCheck<C> for DefaultReadyCheck {
    async fn check(&self, conn: &C, deadline: Instant) -> Liveness {
        let mut current = conn.state();
        loop {
            if current.is_terminal() {
                return Liveness::from(current);
            }
            match time::timeout_at(deadline, conn.state_changed(current)).await {
                Ok(next) => current = next,
                Err(_) => return Liveness::Idle,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::connection::{Connection, ConnectivityState};
    use std::time::Duration;
    use tokio::sync::watch;

    struct FakeChannel {
        state: watch::Sender<ConnectivityState>,
    }

    impl FakeChannel {
        fn new(initial: ConnectivityState) -> Self {
            let (state, _) = watch::channel(initial);
            Self { state }
        }
    }

    impl Connection for FakeChannel {
        fn close(&self) {
            self.state.send_replace(ConnectivityState::Shutdown);
        }
    }

    #[async_trait]
    impl Connectivity for FakeChannel {
        fn state(&self) -> ConnectivityState {
            *self.state.borrow()
        }

        async fn state_changed(&self, from: ConnectivityState) -> ConnectivityState {
                let mut rx = self.state.subscribe();
            let next = match rx.wait_for(|s| *s != from).await {
                Ok(s) => *s,
                Err(_) => ConnectivityState::Shutdown,
            };
            next
        }
    }

    #[tokio::test(start_paused = true)]
    async fn returns_terminal_state_immediately() {
        let deadline = Instant::now() + Duration::from_secs(1);
        let ready = FakeChannel::new(ConnectivityState::Ready);
        assert_eq!(DefaultReadyCheck.check(&ready, deadline).await, Liveness::Ready);

        let closed = FakeChannel::new(ConnectivityState::Shutdown);
        assert_eq!(DefaultReadyCheck.check(&closed, deadline).await, Liveness::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_as_idle() {
        let chan = FakeChannel::new(ConnectivityState::Connecting);
        let deadline = Instant::now() + Duration::from_millis(200);
        assert_eq!(DefaultReadyCheck.check(&chan, deadline).await, Liveness::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn follows_transitions_until_ready() {
        let chan = std::sync::Arc::new(FakeChannel::new(ConnectivityState::Idle));
        let driver = chan.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(10)).await;
            driver.state.send_replace(ConnectivityState::Connecting);
            time::sleep(Duration::from_millis(10)).await;
            driver.state.send_replace(ConnectivityState::TransientFailure);
            time::sleep(Duration::from_millis(10)).await;
            driver.state.send_replace(ConnectivityState::Ready);
        });

        let deadline = Instant::now() + Duration::from_secs(1);
        assert_eq!(DefaultReadyCheck.check(&*chan, deadline).await, Liveness::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn observes_close_while_waiting() {
        let chan = std::sync::Arc::new(FakeChannel::new(ConnectivityState::Connecting));
        let closer = chan.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(5)).await;
            closer.close();
        });

        let deadline = Instant::now() + Duration::from_secs(1);
        assert_eq!(DefaultReadyCheck.check(&*chan, deadline).await, Liveness::Shutdown);
    }
}
