//! Prometheus metrics

use axum::response::IntoResponse;
use once_cell::sync::OnceCell;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder; idempotent across calls
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
        }
        Err(e) => {
            tracing::warn!("Failed to install Prometheus recorder: {}", e);
        }
    }
}

/// Render the metrics snapshot
pub async fn metrics_handler() -> impl IntoResponse {
    match HANDLE.get() {
        Some(handle) => handle.render(),
        None => String::new(),
    }
}

/// Count one analysis request by outcome status code
pub fn record_request(status: u16) {
    metrics::counter!("callqa_requests_total", "status" => status.to_string()).increment(1);
}

/// Count one error by taxonomy variant name
pub fn record_error(kind: &'static str) {
    metrics::counter!("callqa_errors_total", "kind" => kind).increment(1);
}

/// Record one analysis request's wall-clock latency
pub fn record_stage_latency(stage: &'static str, seconds: f64) {
    metrics::histogram!("callqa_stage_latency_seconds", "stage" => stage).record(seconds);
}
