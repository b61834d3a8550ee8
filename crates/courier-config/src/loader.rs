//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, CourierConfig, LogFormat};

/// Loads configuration in layers.
///
/// Later layers override earlier ones:
/// 1. Defaults or a preset
/// 2. A configuration file or string (replaces the whole configuration;
///    sections it omits take their defaults)
/// 3. `PREFIX__SECTION__KEY` environment variables for scalar keys
///
/// # Example
///
/// ```
/// use courier_config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_string(
///         r#"
///         [dispatch]
///         default_format = "json"
///
///         [resources.node.POST]
///         hal_json = true
///         "#,
///         "toml",
///     )
///     .unwrap()
///     .load()
///     .unwrap();
///
/// assert_eq!(config.dispatch.default_format, "json");
/// assert!(config.resources.allowed_formats("node", "POST").is_some());
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: CourierConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CourierConfig::default(),
            env_prefix: None,
        }
    }

    /// Resets to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = CourierConfig::default();
        self
    }

    /// Starts from the development preset.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = CourierConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = CourierConfig::production();
        self
    }

    /// Loads a `.toml` or `.json` file.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        self.config = parse(&content, &format)?;
        Ok(self)
    }

    /// Loads a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `toml` or `json`.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, &format.to_lowercase())?;
        Ok(self)
    }

    /// Enables `PREFIX__SECTION__KEY` overrides, e.g.
    /// `COURIER__DISPATCH__DEFAULT_FORMAT=json`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads variables from a `.env` file if one exists.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::env_parse_error(".env", e.to_string())),
        }
    }

    /// Applies environment overrides and validates.
    pub fn load(self) -> Result<CourierConfig, ConfigError> {
        let mut config = self.config;
        if let Some(prefix) = &self.env_prefix {
            apply_env_overrides(&mut config, prefix, true)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides without validating.
    ///
    /// Overrides that fail to parse are skipped.
    #[must_use]
    pub fn load_unvalidated(self) -> CourierConfig {
        let mut config = self.config;
        if let Some(prefix) = &self.env_prefix {
            let _ = apply_env_overrides(&mut config, prefix, false);
        }
        config
    }
}

fn parse(content: &str, format: &str) -> Result<CourierConfig, ConfigError> {
    match format {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::unsupported_format(other)),
    }
}

fn apply_env_overrides(
    config: &mut CourierConfig,
    prefix: &str,
    strict: bool,
) -> Result<(), ConfigError> {
    let mut vars: Vec<(String, String)> = env::vars()
        .filter(|(k, _)| k.starts_with(prefix))
        .collect();
    vars.sort();

    for (key, value) in vars {
        match apply_env_var(config, prefix, &key, &value) {
            Err(e) if strict => return Err(e),
            _ => {}
        }
    }
    Ok(())
}

fn apply_env_var(
    config: &mut CourierConfig,
    prefix: &str,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
        return Ok(());
    };
    let parts: Vec<&str> = rest.split("__").collect();

    match parts.as_slice() {
        ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
        ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
            config.server.shutdown_timeout_secs = parse_number(key, value)?;
        }
        ["SERVER", "REQUEST_TIMEOUT_MS"] => {
            config.server.request_timeout_ms = parse_number(key, value)?;
        }
        ["SERVER", "MAX_CONNECTIONS"] => {
            config.server.max_connections = if value.is_empty() || value.eq_ignore_ascii_case("none")
            {
                None
            } else {
                Some(parse_number(key, value)?)
            };
        }

        ["TELEMETRY", "SERVICE_NAME"] => config.telemetry.service_name = value.to_string(),
        ["TELEMETRY", "LOGGING", "ENABLED"] => {
            config.telemetry.logging.enabled = parse_flag(key, value)?;
        }
        ["TELEMETRY", "LOGGING", "LEVEL"] => config.telemetry.logging.level = value.to_string(),
        ["TELEMETRY", "LOGGING", "FORMAT"] => {
            config.telemetry.logging.format = match value.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::env_parse_error(
                        key,
                        "expected 'json' or 'pretty'",
                    ))
                }
            };
        }
        ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
            config.telemetry.logging.include_location = parse_flag(key, value)?;
        }
        ["TELEMETRY", "METRICS", "ENABLED"] => {
            config.telemetry.metrics.enabled = parse_flag(key, value)?;
        }

        ["DISPATCH", "DEFAULT_FORMAT"] => config.dispatch.default_format = value.to_string(),
        ["DISPATCH", "MAX_BODY_BYTES"] => {
            config.dispatch.max_body_bytes = parse_number(key, value)?;
        }

        _ => {}
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str) -> NamedTempFile {
        tempfile::Builder::new().suffix(suffix).tempfile().unwrap()
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, CourierConfig::default());
    }

    #[test]
    fn test_loader_presets() {
        let config = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(config.telemetry.logging.format, LogFormat::Pretty);

        let config = ConfigLoader::new()
            .with_development()
            .with_production()
            .load()
            .unwrap();
        assert_eq!(config.telemetry.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_toml_file() {
        let mut file = temp_file(".toml");
        writeln!(
            file,
            r#"
            [server]
            http_addr = "127.0.0.1:3000"

            [resources.node.POST]
            json = true
            "#
        )
        .unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert!(config
            .resources
            .allowed_formats("node", "POST")
            .unwrap()
            .contains("json"));
    }

    #[test]
    fn test_loader_json_file() {
        let mut file = temp_file(".json");
        write!(file, r#"{{"dispatch": {{"max_body_bytes": 2048}}}}"#).unwrap();

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.dispatch.max_body_bytes, 2048);
    }

    #[test]
    fn test_loader_missing_file() {
        let result = ConfigLoader::new().with_file("/nonexistent/courier.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));

        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/courier.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, CourierConfig::default());
    }

    #[test]
    fn test_loader_unsupported_extension() {
        let file = temp_file(".yaml");
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_loader_unknown_field_rejected() {
        let result = ConfigLoader::new().with_string("[server]\nport = 80", "toml");
        assert!(matches!(result, Err(ConfigError::TomlError(_))));
    }

    #[test]
    fn test_loader_validation_runs_on_load() {
        let loader = ConfigLoader::new()
            .with_string(r#"{"resources": {"node": {"BAD METHOD": {"json": true}}}}"#, "json")
            .unwrap();
        assert!(loader.load().is_err());
    }

    #[test]
    fn test_load_unvalidated_skips_validation() {
        let config = ConfigLoader::new()
            .with_string("[dispatch]\nmax_body_bytes = 0", "toml")
            .unwrap()
            .load_unvalidated();
        assert_eq!(config.dispatch.max_body_bytes, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_env_var() {
        let mut config = CourierConfig::default();
        apply_env_var(&mut config, "COURIER", "COURIER__DISPATCH__DEFAULT_FORMAT", "json").unwrap();
        apply_env_var(&mut config, "COURIER", "COURIER__SERVER__MAX_CONNECTIONS", "64").unwrap();
        apply_env_var(&mut config, "COURIER", "COURIER__TELEMETRY__METRICS__ENABLED", "off").unwrap();
        apply_env_var(&mut config, "COURIER", "COURIER__UNKNOWN__KEY", "x").unwrap();

        assert_eq!(config.dispatch.default_format, "json");
        assert_eq!(config.server.max_connections, Some(64));
        assert!(!config.telemetry.metrics.enabled);
    }

    #[test]
    fn test_apply_env_var_parse_errors() {
        let mut config = CourierConfig::default();
        assert!(matches!(
            apply_env_var(&mut config, "COURIER", "COURIER__DISPATCH__MAX_BODY_BYTES", "lots"),
            Err(ConfigError::EnvParseError { .. })
        ));
        assert!(apply_env_var(&mut config, "COURIER", "COURIER__TELEMETRY__LOGGING__FORMAT", "xml").is_err());
    }

    #[test]
    fn test_env_prefix_override() {
        env::set_var("COURIERTEST__DISPATCH__DEFAULT_FORMAT", "json");
        let config = ConfigLoader::new()
            .with_env_prefix("couriertest")
            .load()
            .unwrap();
        env::remove_var("COURIERTEST__DISPATCH__DEFAULT_FORMAT");
        assert_eq!(config.dispatch.default_format, "json");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
