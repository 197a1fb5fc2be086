//! Prometheus metrics endpoint and HTTP metrics middleware

pub mod handlers;
pub mod middleware;

pub use handlers::{prometheus_metrics, MetricsState};
pub use middleware::http_metrics_middleware;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!("parking_bookings_total", "Booking attempts by outcome");
    metrics::describe_counter!("parking_cancellations_total", "Reservations cancelled");
    metrics::describe_counter!("parking_completions_total", "Reservations completed");
    metrics::describe_counter!("http_requests_total", "HTTP requests by route and status");
    metrics::describe_histogram!("http_request_duration_seconds", "HTTP request latency");

    Ok(handle)
}
