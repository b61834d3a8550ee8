//! Format errors.

use std::fmt;

use courier_core::DispatchError;
use http::StatusCode;

/// Error raised while resolving, decoding or encoding a wire format.
///
/// Parse failures are distinguishable from every other kind so the
/// dispatcher can answer 400 for them and 415 or 500 for the rest.
///
/// # Example
///
/// ```rust
/// use courier_format::FormatError;
/// use http::StatusCode;
///
/// let err = FormatError::parse("json", "expected value at line 1 column 1");
/// assert!(err.is_parse());
/// assert_eq!(err.format(), Some("json"));
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    format: Option<String>,
    kind: FormatErrorKind,
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormatErrorKind {
    UnknownFormat,
    Parse,
    Encode,
}

impl FormatError {
    /// No codec is registered under this name.
    #[must_use]
    pub fn unknown_format(format: Option<&str>) -> Self {
        Self {
            format: format.map(str::to_string),
            kind: FormatErrorKind::UnknownFormat,
            message: format!("no codec for format '{}'", format.unwrap_or("none")),
        }
    }

    /// The payload is not valid in the given format.
    #[must_use]
    pub fn parse(format: &str, details: impl Into<String>) -> Self {
        Self {
            format: Some(format.to_string()),
            kind: FormatErrorKind::Parse,
            message: details.into(),
        }
    }

    /// A value cannot be represented in the given format.
    #[must_use]
    pub fn encode(format: &str, details: impl Into<String>) -> Self {
        Self {
            format: Some(format.to_string()),
            kind: FormatErrorKind::Encode,
            message: details.into(),
        }
    }

    /// Returns the format involved, if known.
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Returns the detail message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true for malformed input.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        self.kind == FormatErrorKind::Parse
    }

    /// Returns true when no codec exists for the format.
    #[must_use]
    pub fn is_unknown_format(&self) -> bool {
        self.kind == FormatErrorKind::UnknownFormat
    }

    /// Returns the HTTP status this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            FormatErrorKind::UnknownFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            FormatErrorKind::Parse => StatusCode::BAD_REQUEST,
            FormatErrorKind::Encode => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FormatError {}

impl From<FormatError> for DispatchError {
    fn from(err: FormatError) -> Self {
        let format = err.format.unwrap_or_default();
        match err.kind {
            FormatErrorKind::UnknownFormat => {
                DispatchError::unsupported_format((!format.is_empty()).then_some(format.as_str()))
            }
            FormatErrorKind::Parse => DispatchError::deserialization(format, err.message),
            FormatErrorKind::Encode => DispatchError::serialization(format, err.message),
        }
    }
}
