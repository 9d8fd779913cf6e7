use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus HTTP exporter on `addr`.
/// After this call, anything recorded through the helpers below is
/// exported at /metrics. Must run inside the tokio runtime.
pub fn init_metrics_server(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    Ok(())
}

// ── Feed metrics ─────────────────────────────────────────────────

/// `outcome` is one of updated, failed, skipped, stopped.
pub fn record_poll(outcome: &'static str) {
    counter!("feed_polls_total", "outcome" => outcome).increment(1);
}

pub fn record_poll_failure(kind: &'static str) {
    counter!("feed_poll_failures_total", "kind" => kind).increment(1);
}

pub fn record_poll_latency_ms(latency_ms: f64) {
    histogram!("feed_poll_latency_ms").record(latency_ms);
}

pub fn record_rows_rejected(rows: usize) {
    counter!("feed_rows_rejected_total").increment(rows as u64);
}

pub fn record_generation(generation: u64) {
    gauge!("feed_snapshot_generation").set(generation as f64);
}
