//! Metrics collection and exposition.
//!
//! # Metrics
//! - `conn_pool_dials_total` (counter): dial attempts by address and result
//! - `conn_pool_transitions_total` (counter): liveness transitions by address and state
//! - `conn_pool_alive_connections` (gauge): size of the alive set
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed, e.g. by [`init_metrics`].

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::net::Liveness;

/// Install the Prometheus exporter with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_dial(address: &str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!("conn_pool_dials_total", "address" => address.to_string(), "result" => result)
        .increment(1);
}

pub fn record_transition(address: &str, state: Liveness) {
    counter!(
        "conn_pool_transitions_total",
        "address" => address.to_string(),
        "state" => state.as_str()
    )
    .increment(1);
}

pub fn record_alive_count(count: usize) {
    gauge!("conn_pool_alive_connections").set(count as f64);
}
