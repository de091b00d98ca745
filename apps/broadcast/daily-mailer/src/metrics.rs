//! Prometheus exporter for the broadcast metrics

use eyre::Result;
use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;

/// Install the global recorder and serve `/metrics` on `addr`.
///
/// Must be called from inside the tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!(%addr, "Prometheus metrics exporter listening");

    describe_counter!("broadcast_runs_total", "Trigger firings by outcome");
    describe_counter!(
        "broadcast_deliveries_total",
        "Per-recipient send outcomes by delivery status"
    );
    describe_counter!(
        "broadcast_delivery_log_failures_total",
        "Outcomes that could not be written to the delivery log"
    );
    describe_histogram!(
        "broadcast_run_duration_seconds",
        Unit::Seconds,
        "Wall time of one dispatch run"
    );

    Ok(())
}
