//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur while installing telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The Prometheus recorder could not be installed.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A filter directive or other setting is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
