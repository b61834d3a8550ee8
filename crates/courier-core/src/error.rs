//! Error types for Courier.
//!
//! [`DispatchError`] is the protocol-level failure type that flows through the
//! dispatch pipeline. Every variant maps to an HTTP status code, and a
//! rejection raised by a resource plugin can additionally carry response
//! headers.
//!
//! | Variant | Category | Status |
//! |---|---|---|
//! | `UnsupportedFormat` | `unsupported_format` | 415 |
//! | `Deserialization` | `deserialization` | 400 |
//! | `PayloadTooLarge` | `payload_too_large` | 413 |
//! | `PluginNotFound` | `resolution` | 404 |
//! | `OperationNotFound` | `resolution` | 404 |
//! | `Rejection` | `rejection` | taken from the error |
//! | `Serialization` | `serialization` | 500 |
//! | `Internal` | `internal` | 500 |

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Categories of dispatch failures, used for logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The request format is not enabled for the resource and method.
    UnsupportedFormat,
    /// The request body could not be parsed.
    Deserialization,
    /// The request body exceeds the configured limit.
    PayloadTooLarge,
    /// The plugin or operation named by the route could not be resolved.
    Resolution,
    /// The operation itself refused the request.
    Rejection,
    /// The response payload could not be encoded.
    Serialization,
    /// Any other server-side failure.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Deserialization | Self::Rejection => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Resolution => StatusCode::NOT_FOUND,
            Self::Serialization | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the snake_case label for this category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported_format",
            Self::Deserialization => "deserialization",
            Self::PayloadTooLarge => "payload_too_large",
            Self::Resolution => "resolution",
            Self::Rejection => "rejection",
            Self::Serialization => "serialization",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protocol-level failure raised while dispatching a request.
///
/// Resource plugins return [`DispatchError::Rejection`] (usually through one
/// of the helper constructors) to refuse a request with a specific status.
///
/// # Example
///
/// ```
/// use courier_core::DispatchError;
/// use http::{HeaderName, HeaderValue, StatusCode};
///
/// let err = DispatchError::forbidden("not your node")
///     .with_header(HeaderName::from_static("x-reason"), HeaderValue::from_static("forbidden"));
///
/// assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
/// assert_eq!(err.client_message(), "not your node");
/// assert!(err.headers().is_some());
/// ```
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The request format is not enabled, or no codec understands it.
    #[error("Unsupported media type: {}", .format.as_deref().unwrap_or("unknown"))]
    UnsupportedFormat {
        /// The request format, if one could be resolved.
        format: Option<String>,
    },

    /// The request body is present but could not be parsed.
    #[error("{message}")]
    Deserialization {
        /// The format used to parse the body.
        format: String,
        /// The parser's message.
        message: String,
    },

    /// The request body exceeds the configured limit.
    #[error("Request body of {actual} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge {
        /// Maximum accepted body size in bytes.
        limit: usize,
        /// Actual body size in bytes.
        actual: usize,
    },

    /// No resource plugin is registered under the routed identifier.
    #[error("Resource plugin '{plugin_id}' was not found")]
    PluginNotFound {
        /// The plugin identifier from the route.
        plugin_id: String,
    },

    /// The plugin does not declare the routed operation.
    #[error("Operation '{operation}' is not defined on resource plugin '{plugin_id}'")]
    OperationNotFound {
        /// The plugin identifier from the route.
        plugin_id: String,
        /// The operation name from the route.
        operation: String,
    },

    /// The invoked operation refused the request.
    #[error("{message}")]
    Rejection {
        /// Status code to respond with.
        status: StatusCode,
        /// Message placed in the error payload.
        message: String,
        /// Headers added to the error response.
        headers: HeaderMap,
    },

    /// The response payload could not be encoded.
    #[error("Failed to serialize response as {format}: {message}")]
    Serialization {
        /// The response format.
        format: String,
        /// The encoder's message.
        message: String,
    },

    /// Internal failure. The message and source are never sent to clients.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl DispatchError {
    /// Creates an unsupported format error.
    #[must_use]
    pub fn unsupported_format(format: Option<&str>) -> Self {
        Self::UnsupportedFormat {
            format: format.map(str::to_string),
        }
    }

    /// Creates a deserialization error carrying the parser message.
    #[must_use]
    pub fn deserialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Deserialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates a payload too large error.
    #[must_use]
    pub const fn payload_too_large(limit: usize, actual: usize) -> Self {
        Self::PayloadTooLarge { limit, actual }
    }

    /// Creates a plugin not found error.
    #[must_use]
    pub fn plugin_not_found(plugin_id: impl Into<String>) -> Self {
        Self::PluginNotFound {
            plugin_id: plugin_id.into(),
        }
    }

    /// Creates an operation not found error.
    #[must_use]
    pub fn operation_not_found(plugin_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::OperationNotFound {
            plugin_id: plugin_id.into(),
            operation: operation.into(),
        }
    }

    /// Creates a rejection with an explicit status code.
    #[must_use]
    pub fn rejection(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Rejection {
            status,
            message: message.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Creates a 400 rejection.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::rejection(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 403 rejection.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::rejection(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 rejection.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::rejection(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 rejection.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::rejection(StatusCode::CONFLICT, message)
    }

    /// Creates a 422 rejection.
    #[must_use]
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::rejection(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source.
    #[must_use]
    pub fn internal_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Adds a response header to a rejection.
    ///
    /// Only [`DispatchError::Rejection`] carries headers; other variants are
    /// returned unchanged.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        if let Self::Rejection { headers, .. } = &mut self {
            headers.insert(name, value);
        }
        self
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedFormat { .. } => ErrorCategory::UnsupportedFormat,
            Self::Deserialization { .. } => ErrorCategory::Deserialization,
            Self::PayloadTooLarge { .. } => ErrorCategory::PayloadTooLarge,
            Self::PluginNotFound { .. } | Self::OperationNotFound { .. } => {
                ErrorCategory::Resolution
            }
            Self::Rejection { .. } => ErrorCategory::Rejection,
            Self::Serialization { .. } => ErrorCategory::Serialization,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Rejection { status, .. } => *status,
            other => other.category().default_status_code(),
        }
    }

    /// Returns the headers supplied with the error, if any.
    #[must_use]
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Self::Rejection { headers, .. } if !headers.is_empty() => Some(headers),
            _ => None,
        }
    }

    /// Returns the message that is safe to send to clients.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal { .. } => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Builds the `{"error": message}` payload for this error.
    #[must_use]
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload::new(self.client_message())
    }
}

/// The single-key body sent for every translated error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// The error message.
    pub error: String,
}

impl ErrorPayload {
    /// Creates a new error payload.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Converts the payload into a structured value.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.error })
    }
}
