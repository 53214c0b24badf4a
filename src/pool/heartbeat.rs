//! Background liveness checks.
//!
//! # Responsibilities
//! - Periodically probe one tracked connection
//! - Apply the resulting transition
//! - Close the handle when the pool shuts down
//!
//! One task runs per dialed handle. It exits when its token is cancelled
//! (pool shutdown, explicit Shutdown, or the handle being replaced) or when
//! a check moves the connection to Shutdown.

use std::sync::Arc;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::net::Connection;
use crate::pool::tracked::TrackedConnection;

pub(crate) fn spawn<C: Connection>(
    tracked: Arc<TrackedConnection<C>>,
    token: CancellationToken,
    generation: u64,
) {
    let period = tracked.heartbeat_interval();

    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracked.heartbeat_cancelled(generation).await;
                    break;
                }
                _ = ticker.tick() => {}
            }

            if !tracked.heartbeat_tick(generation).await {
                break;
            }
        }

        tracing::trace!(address = %tracked.address(), generation, "Heartbeat stopped");
    });
}
