//! Structured logging for Courier.
//!
//! Installs a global `tracing` subscriber writing JSON lines (production)
//! or pretty multi-line records (development), filtered by an
//! [`EnvFilter`] directive.
//!
//! # Example
//!
//! ```rust,ignore
//! use courier_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(plugin = "node", operation = "create", "Dispatching");
//! ```

use courier_config::{LogFormat, TelemetryConfigSection};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Level or filter directive (`info`, `warn,courier_dispatch=debug`).
    pub level: String,

    /// Emit JSON lines instead of pretty output.
    pub json_format: bool,

    /// Log span creation and close events.
    pub span_events: bool,

    /// Include source file and line.
    pub file_line_info: bool,

    /// Include thread ids.
    pub thread_ids: bool,

    /// Include the module path.
    pub include_target: bool,

    /// Service name recorded at startup.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            thread_ids: false,
            include_target: true,
            service_name: "courier".to_string(),
        }
    }
}

impl LogConfig {
    /// Human-readable debug output with span events and locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// JSON output at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

impl From<&TelemetryConfigSection> for LogConfig {
    fn from(section: &TelemetryConfigSection) -> Self {
        let logging = &section.logging;
        Self {
            enabled: logging.enabled,
            level: logging.level.clone(),
            json_format: logging.format == LogFormat::Json,
            span_events: false,
            file_line_info: logging.include_location,
            thread_ids: false,
            include_target: true,
            service_name: section.service_name.clone(),
        }
    }
}

/// Installs the global subscriber.
///
/// Disabled logging is a no-op. Installing twice returns
/// [`TelemetryError::LoggingInit`].
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);

    let layer = if config.json_format {
        layer.json().with_filter(filter).boxed()
    } else {
        layer.pretty().with_filter(filter).boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::info!(
        service.name = %config.service_name,
        level = %config.level,
        json = config.json_format,
        "Logging initialized"
    );
    Ok(())
}

/// Parses a filter directive such as `info` or `courier=debug,hyper=warn`.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::InvalidConfig(format!("invalid log filter `{filter}`: {e}")))
}

/// Standard log field names.
pub mod fields {
    /// Request id.
    pub const REQUEST_ID: &str = "request_id";

    /// Plugin id.
    pub const PLUGIN: &str = "plugin";

    /// Operation name.
    pub const OPERATION: &str = "operation";

    /// HTTP method.
    pub const HTTP_METHOD: &str = "http.method";

    /// HTTP path.
    pub const HTTP_PATH: &str = "http.path";

    /// Response status code.
    pub const HTTP_STATUS: &str = "http.status_code";

    /// Request body format.
    pub const FORMAT: &str = "format";

    /// Elapsed time in milliseconds.
    pub const DURATION_MS: &str = "duration_ms";

    /// Error message.
    pub const ERROR: &str = "error";

    /// Error category.
    pub const ERROR_CATEGORY: &str = "error.category";

    /// Service name.
    pub const SERVICE_NAME: &str = "service.name";
}

/// Logs the start of a dispatch.
#[macro_export]
macro_rules! log_dispatch_start {
    ($request_id:expr, $method:expr, $plugin:expr, $operation:expr) => {
        $crate::__tracing::info!(
            request_id = %$request_id,
            http.method = %$method,
            plugin = %$plugin,
            operation = %$operation,
            "Dispatch started"
        );
    };
}

/// Logs a completed dispatch.
#[macro_export]
macro_rules! log_dispatch_complete {
    ($request_id:expr, $status:expr, $duration_ms:expr) => {
        $crate::__tracing::info!(
            request_id = %$request_id,
            http.status_code = $status,
            duration_ms = $duration_ms,
            "Dispatch completed"
        );
    };
}

/// Logs a failed dispatch.
#[macro_export]
macro_rules! log_dispatch_error {
    ($request_id:expr, $error:expr, $category:expr, $status:expr) => {
        $crate::__tracing::warn!(
            request_id = %$request_id,
            error = %$error,
            error.category = %$category,
            http.status_code = $status,
            "Dispatch failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::LoggingConfig;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert!(config.json_format);
        assert_eq!(config.level, "info");
        assert_eq!(config.service_name, "courier");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_production_config() {
        assert_eq!(LogConfig::production(), LogConfig::default());
    }

    #[test]
    fn test_from_config_section() {
        let section = TelemetryConfigSection {
            service_name: "content-api".to_string(),
            logging: LoggingConfig {
                level: "warn,courier_dispatch=debug".to_string(),
                format: LogFormat::Pretty,
                include_location: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let config = LogConfig::from(&section);
        assert_eq!(config.service_name, "content-api");
        assert_eq!(config.level, "warn,courier_dispatch=debug");
        assert!(!config.json_format);
        assert!(config.file_line_info);
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("courier=debug,hyper=warn").is_ok());
        assert!(matches!(
            create_env_filter("courier=loud"),
            Err(TelemetryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_macros_expand() {
        log_dispatch_start!("req-1", "POST", "node", "create");
        log_dispatch_complete!("req-1", 201u16, 3u64);
        log_dispatch_error!("req-1", "boom", "internal", 500u16);
    }
}
