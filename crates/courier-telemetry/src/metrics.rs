//! Prometheus metrics for dispatch.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `courier_dispatch_total` | Counter | `plugin`, `operation`, `status` |
//! | `courier_dispatch_duration_seconds` | Histogram | `plugin`, `operation` |
//! | `courier_dispatch_errors_total` | Counter | `plugin`, `category` |
//! | `courier_dispatch_in_flight` | Gauge | - |
//!
//! Recording before [`init_metrics`] is a no-op.

use std::sync::OnceLock;
use std::time::Duration;

use courier_config::MetricsConfig;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Dispatch counter.
pub const DISPATCH_TOTAL: &str = "courier_dispatch_total";
/// Dispatch latency histogram.
pub const DISPATCH_DURATION: &str = "courier_dispatch_duration_seconds";
/// Failed dispatch counter.
pub const DISPATCH_ERRORS: &str = "courier_dispatch_errors_total";
/// In-flight dispatch gauge.
pub const DISPATCH_IN_FLIGHT: &str = "courier_dispatch_in_flight";

/// 1ms to 10s.
const DURATION_BUCKETS: [f64; 12] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder.
///
/// No HTTP listener is started; the server renders [`render_metrics`] at
/// `/metrics`. Calling this again after a successful install is a no-op.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled || METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(DISPATCH_DURATION.to_string()), &DURATION_BUCKETS)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    describe_metrics();
    Ok(())
}

/// Returns true once a recorder is installed.
#[must_use]
pub fn metrics_installed() -> bool {
    METRICS_HANDLE.get().is_some()
}

/// Renders all metrics in Prometheus text format.
///
/// Returns `None` if no recorder is installed.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!(DISPATCH_TOTAL, "Dispatched requests by plugin, operation and status");
    describe_histogram!(DISPATCH_DURATION, "Dispatch duration in seconds");
    describe_counter!(DISPATCH_ERRORS, "Failed dispatches by plugin and error category");
    describe_gauge!(DISPATCH_IN_FLIGHT, "Dispatches currently running");
}

/// Records a finished dispatch, successful or not.
pub fn record_dispatch(plugin: &str, operation: &str, status: u16, duration: Duration) {
    counter!(
        DISPATCH_TOTAL,
        "plugin" => plugin.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        DISPATCH_DURATION,
        "plugin" => plugin.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a failed dispatch by error category.
pub fn record_dispatch_error(plugin: &str, category: &str) {
    counter!(
        DISPATCH_ERRORS,
        "plugin" => plugin.to_string(),
        "category" => category.to_string()
    )
    .increment(1);
}

/// Keeps the in-flight gauge raised while alive.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Raises the gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(DISPATCH_IN_FLIGHT).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(DISPATCH_IN_FLIGHT).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder() {
        record_dispatch("node", "create", 201, Duration::from_millis(4));
        record_dispatch_error("node", "deserialization");
        let guard = InFlightGuard::new();
        drop(guard);
    }

    #[test]
    fn test_disabled_metrics_is_noop() {
        let config = MetricsConfig { enabled: false };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_install_and_render() {
        init_metrics(&MetricsConfig::default()).unwrap();
        assert!(metrics_installed());
        // Second call keeps the first recorder.
        init_metrics(&MetricsConfig::default()).unwrap();

        record_dispatch("node", "read", 200, Duration::from_millis(2));
        record_dispatch_error("node", "resolution");
        let rendered = render_metrics().unwrap();
        assert!(rendered.contains(DISPATCH_TOTAL));
        assert!(rendered.contains("plugin=\"node\""));
        assert!(rendered.contains(DISPATCH_ERRORS));
    }
}
