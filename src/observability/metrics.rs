//! Metrics collection and exposition.
//!
//! # Metrics
//! - `app_requests_total` (counter): requests by method, status
//! - `app_request_duration_seconds` (histogram): latency distribution
//! - `app_requests_in_flight` (gauge): requests currently being served
//! - `app_lifecycle_state` (gauge): 0=running, 1=draining, 2=stopped, 3=force_killed
//! - `app_shutdowns_total` (counter): shutdown sequences by outcome
//! - `app_shutdown_duration_seconds` (histogram): signal to stop/kill
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Recording without an installed exporter is a no-op (tests, embedding)

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::lifecycle::state::LifecycleState;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "app_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("app_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_in_flight(count: u64) {
    gauge!("app_requests_in_flight").set(count as f64);
}

pub fn record_lifecycle_state(state: LifecycleState) {
    gauge!("app_lifecycle_state").set(f64::from(state as u8));
}

pub fn record_shutdown(outcome: &'static str, elapsed: Duration) {
    counter!("app_shutdowns_total", "outcome" => outcome).increment(1);
    histogram!("app_shutdown_duration_seconds").record(elapsed.as_secs_f64());
}
