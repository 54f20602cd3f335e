//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mock_requests_total` (counter): requests by method, status, source label
//! - `mock_request_duration_seconds` (histogram): latency including declared delays
//! - `mock_table_rebuilds_total` (counter): dispatch tables installed
//! - `mock_routes_active` (gauge): declared routes in the installed table
//! - `mock_plugin_load_failures_total` (counter): plugin files skipped

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, source: &str, start: Instant) {
    let status = status.to_string();
    ::metrics::counter!(
        "mock_requests_total",
        "method" => method.to_string(),
        "status" => status.clone(),
        "source" => source.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "mock_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_rebuild(declared_routes: usize) {
    ::metrics::counter!("mock_table_rebuilds_total").increment(1);
    ::metrics::gauge!("mock_routes_active").set(declared_routes as f64);
}

pub fn record_plugin_load_failure() {
    ::metrics::counter!("mock_plugin_load_failures_total").increment(1);
}
