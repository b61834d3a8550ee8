//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read a configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported file extension or format name.
    #[error("unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The extension or format name.
        format: String,
    },

    /// A field holds an invalid value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the field.
        field: String,
        /// Why the value is invalid.
        reason: String,
    },

    /// An environment override could not be parsed.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Why parsing failed.
        reason: String,
    },

    /// The file watcher could not be set up.
    #[error("file watcher error: {message}")]
    Watch {
        /// Description of the failure.
        message: String,
    },
}

impl ConfigError {
    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates a read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates an unsupported format error.
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an environment parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Creates a watcher error.
    pub fn watch(message: impl Into<String>) -> Self {
        Self::Watch {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::invalid_value("dispatch.max_body_bytes", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "invalid configuration value for dispatch.max_body_bytes: must be greater than zero"
        );

        let err = ConfigError::file_not_found("/etc/courier.toml");
        assert!(err.to_string().contains("/etc/courier.toml"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse: Result<toml::Value, _> = toml::from_str("[server");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(matches!(err, ConfigError::TomlError(_)));
    }
}
