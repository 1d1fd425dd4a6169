//! Metrics collection and exposition.
//!
//! # Metrics
//! - `zenrelay_wallet_operations_total` (counter): by operation, outcome
//! - `zenrelay_network_status` (gauge): 1 for the current status, 0 otherwise
//! - `zenrelay_swaps_total` (counter): by outcome
//! - `zenrelay_badges_minted_total` (counter)
//! - `zenrelay_http_requests_total` (counter) and
//!   `zenrelay_http_request_duration_seconds` (histogram): by method, status
//!
//! Recording without an installed exporter is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::wallet::NetworkStatus;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_wallet_operation(operation: &'static str, outcome: &'static str) {
    counter!("zenrelay_wallet_operations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

pub fn record_network_status(status: NetworkStatus) {
    for candidate in [
        NetworkStatus::Connected,
        NetworkStatus::Disconnected,
        NetworkStatus::WrongNetwork,
    ] {
        let value = if candidate == status { 1.0 } else { 0.0 };
        gauge!("zenrelay_network_status", "status" => candidate.as_str()).set(value);
    }
}

pub fn record_swap(outcome: &'static str) {
    counter!("zenrelay_swaps_total", "outcome" => outcome).increment(1);
}

pub fn record_badge_minted() {
    counter!("zenrelay_badges_minted_total").increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    counter!(
        "zenrelay_http_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "zenrelay_http_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}
