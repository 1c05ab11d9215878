//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by dispatch kind and status
//! - `gateway_request_duration_seconds` (histogram): time to response headers
//! - `gateway_upstream_errors_total` (counter): failed upstream exchanges by kind
//! - `gateway_active_splices` (gauge): upgraded connections being relayed
//!
//! # Design Decisions
//! - Recording is always on; without an installed exporter the `metrics`
//!   macros are no-ops
//! - Labels stay low-cardinality: no paths, hosts or client addresses

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(dispatch: &'static str, status: u16, started: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "dispatch" => dispatch,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "dispatch" => dispatch)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_upstream_error(kind: &'static str) {
    metrics::counter!("gateway_upstream_errors_total", "kind" => kind).increment(1);
}

/// Keeps `gateway_active_splices` incremented while alive.
#[derive(Debug)]
pub struct SpliceGauge(());

impl SpliceGauge {
    pub fn start() -> Self {
        metrics::gauge!("gateway_active_splices").increment(1.0);
        Self(())
    }
}

impl Drop for SpliceGauge {
    fn drop(&mut self) {
        metrics::gauge!("gateway_active_splices").decrement(1.0);
    }
}
