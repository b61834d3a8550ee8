//! Configuration sections.

use serde::{Deserialize, Serialize};

/// `[server]`: HTTP host settings.
///
/// # Example
///
/// ```
/// use courier_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.shutdown_timeout_secs, 30);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Time allowed for in-flight connections to drain on shutdown.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Time allowed for collecting a body and for dispatching it.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Maximum concurrent connections. Unlimited when absent.
    #[serde(default)]
    pub max_connections: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_connections: None,
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30_000
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// `[telemetry.logging]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Level or filter directive (`info`, `courier_dispatch=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// `[telemetry.metrics]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// `[telemetry]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name attached to logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

fn default_service_name() -> String {
    "courier".to_string()
}

/// `[dispatch]`: pipeline settings.
///
/// # Example
///
/// ```
/// use courier_config::DispatchConfig;
///
/// let config = DispatchConfig::default();
/// assert_eq!(config.default_format, "hal_json");
/// assert_eq!(config.max_body_bytes, 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Response format for routes that do not fix one.
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Largest accepted request body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_format() -> String {
    "hal_json".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "0.0.0.0:8080");
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.max_connections, None);
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: TelemetryConfigSection = toml::from_str(
            r#"
            service_name = "content-api"
            [logging]
            format = "pretty"
            "#,
        )
        .unwrap();
        assert_eq!(config.service_name, "content-api");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.level, "info");
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<DispatchConfig, _> = toml::from_str("max_body = 10");
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_serde() {
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
        let format: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }
}
