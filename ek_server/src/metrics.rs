//! Prometheus metrics for authentication and configuration traffic.
//!
//! Counters are no-ops until [`init_metrics`] installs the exporter.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// Record a login attempt and its outcome.
pub fn login_attempt(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("auth_login_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a successful registration.
pub fn registration() {
    metrics::counter!("auth_registrations_total").increment(1);
}

/// Record a rejected bearer token.
pub fn token_rejected() {
    metrics::counter!("auth_token_rejections_total").increment(1);
}

/// Record a configuration write (`set` or `delete`).
pub fn config_write(operation: &'static str, environment: &'static str) {
    metrics::counter!("config_writes_total",
        "operation" => operation,
        "environment" => environment
    )
    .increment(1);
}
