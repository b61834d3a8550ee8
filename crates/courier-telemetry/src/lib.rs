//! Logging and metrics for Courier.
//!
//! - **Logging**: a `tracing-subscriber` pipeline with JSON or pretty
//!   output, filtered by an `EnvFilter` directive
//! - **Metrics**: dispatch counters and latency histograms via the
//!   `metrics` facade, rendered in Prometheus text format
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `courier_dispatch_total` | Counter | `plugin`, `operation`, `status` |
//! | `courier_dispatch_duration_seconds` | Histogram | `plugin`, `operation` |
//! | `courier_dispatch_errors_total` | Counter | `plugin`, `category` |
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_config::CourierConfig;
//! use courier_telemetry::init_telemetry;
//!
//! let config = CourierConfig::production();
//! init_telemetry(&config.telemetry)?;
//! ```

#![doc(html_root_url = "https://docs.rs/courier-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

use courier_config::TelemetryConfigSection;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig};
pub use self::metrics::{
    init_metrics, metrics_installed, record_dispatch, record_dispatch_error, render_metrics,
    InFlightGuard,
};

#[doc(hidden)]
pub use tracing as __tracing;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Installs logging, then metrics, from the `[telemetry]` section.
pub fn init_telemetry(config: &TelemetryConfigSection) -> TelemetryResult<()> {
    init_logging(&LogConfig::from(config))?;
    init_metrics(&config.metrics)
}
