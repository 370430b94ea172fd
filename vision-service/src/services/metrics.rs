//! Metrics collection and Prometheus export.
//!
//! Initializes the metrics exporter and provides the gateway-level recorders.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder.
///
/// Call once at startup before any metrics are recorded; later calls are ignored.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::error!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

pub fn record_upload(outcome: &'static str) {
    counter!("vision_uploads_total", "outcome" => outcome).increment(1);
}

pub fn record_inference(model: &str, elapsed: Duration, success: bool) {
    let outcome = if success { "success" } else { "error" };
    histogram!(
        "vision_inference_duration_seconds",
        "model" => model.to_string(),
        "outcome" => outcome
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_edit(outcome: &'static str) {
    counter!("vision_analysis_edits_total", "outcome" => outcome).increment(1);
}
