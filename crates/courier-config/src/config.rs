//! The root configuration type.

use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, DispatchConfig, EnablementTable, LogFormat, ServerConfig, TelemetryConfigSection,
};

/// Complete Courier configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// # Example
///
/// ```
/// use courier_config::CourierConfig;
///
/// let config = CourierConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert_eq!(config.dispatch.default_format, "hal_json");
/// assert!(config.resources.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// HTTP host settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging and metrics.
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,

    /// Dispatch pipeline settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Format enablement table.
    #[serde(default)]
    pub resources: EnablementTable,
}

impl CourierConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> CourierConfigBuilder {
        CourierConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .server
            .http_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }
        if self.server.shutdown_timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "server.shutdown_timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.server.request_timeout_ms == 0 {
            return Err(ConfigError::invalid_value(
                "server.request_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.server.max_connections == Some(0) {
            return Err(ConfigError::invalid_value(
                "server.max_connections",
                "must be greater than zero when set",
            ));
        }
        if self.dispatch.max_body_bytes == 0 {
            return Err(ConfigError::invalid_value(
                "dispatch.max_body_bytes",
                "must be greater than zero",
            ));
        }
        if self.dispatch.default_format.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "dispatch.default_format",
                "must not be empty",
            ));
        }
        validate_level(&self.telemetry.logging.level)?;
        self.resources.validate()
    }

    /// Local development preset: pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.http_addr = "127.0.0.1:8080".to_string();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config
    }

    /// Production preset: JSON info logs with metrics.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;
        config.telemetry.metrics.enabled = true;
        config
    }
}

fn validate_level(level: &str) -> Result<(), ConfigError> {
    const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];
    let valid = level.split(',').map(str::trim).all(|directive| {
        let level = directive.rsplit('=').next().unwrap_or(directive);
        !directive.is_empty() && LEVELS.iter().any(|l| l.eq_ignore_ascii_case(level))
    });
    if valid {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            "telemetry.logging.level",
            format!("invalid level or directive: {level}"),
        ))
    }
}

/// Builder for [`CourierConfig`].
#[derive(Debug, Default)]
pub struct CourierConfigBuilder {
    config: CourierConfig,
}

impl CourierConfigBuilder {
    /// Sets the server section.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Sets the telemetry section.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.config.telemetry = telemetry;
        self
    }

    /// Sets the dispatch section.
    #[must_use]
    pub fn dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.config.dispatch = dispatch;
        self
    }

    /// Sets the enablement table.
    #[must_use]
    pub fn resources(mut self, resources: EnablementTable) -> Self {
        self.config.resources = resources;
        self
    }

    /// Builds the configuration without validating it.
    #[must_use]
    pub fn build(self) -> CourierConfig {
        self.config
    }
}
