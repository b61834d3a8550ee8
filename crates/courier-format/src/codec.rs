//! Codecs for individual wire formats.

use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::FormatError;

/// Converts between raw bytes and structured values for one format.
///
/// A codec is addressed by its format name (`json`, `hal_json`, ...) and
/// advertises the MIME type used for its `Content-Type` header.
pub trait Codec: Send + Sync {
    /// The format name routes and configuration refer to.
    fn format(&self) -> &str;

    /// The MIME type written to `Content-Type`.
    fn mime_type(&self) -> &str;

    /// Parses a non-empty payload.
    fn decode(&self, bytes: &[u8]) -> Result<Value, FormatError>;

    /// Encodes a value.
    fn encode(&self, value: &Value) -> Result<Bytes, FormatError>;
}

/// JSON and JSON-based formats such as HAL.
///
/// # Example
///
/// ```rust
/// use courier_format::{Codec, JsonCodec};
/// use serde_json::json;
///
/// let hal = JsonCodec::hal();
/// assert_eq!(hal.format(), "hal_json");
/// assert_eq!(hal.mime_type(), "application/hal+json");
/// assert_eq!(hal.decode(br#"{"title":"Hello"}"#).unwrap(), json!({"title": "Hello"}));
/// ```
#[derive(Debug, Clone)]
pub struct JsonCodec {
    format: String,
    mime_type: String,
}

impl JsonCodec {
    /// Plain JSON (`json`, `application/json`).
    #[must_use]
    pub fn new() -> Self {
        Self::named("json", "application/json")
    }

    /// HAL (`hal_json`, `application/hal+json`).
    #[must_use]
    pub fn hal() -> Self {
        Self::named("hal_json", "application/hal+json")
    }

    /// A JSON codec under a custom format name and MIME type.
    #[must_use]
    pub fn named(format: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            mime_type: mime_type.into(),
        }
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for JsonCodec {
    fn format(&self) -> &str {
        &self.format
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, FormatError> {
        serde_json::from_slice(bytes).map_err(|e| FormatError::parse(&self.format, e.to_string()))
    }

    fn encode(&self, value: &Value) -> Result<Bytes, FormatError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| FormatError::encode(&self.format, e.to_string()))
    }
}

/// `application/x-www-form-urlencoded` bodies.
///
/// Decoding yields an object of strings; a repeated key yields an array of
/// its values. Encoding accepts a flat object whose members are scalars or
/// arrays of scalars.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCodec;

impl FormCodec {
    const FORMAT: &'static str = "form";

    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => Some(String::new()),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl Codec for FormCodec {
    fn format(&self) -> &str {
        Self::FORMAT
    }

    fn mime_type(&self) -> &str {
        "application/x-www-form-urlencoded"
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, FormatError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(bytes)
            .map_err(|e| FormatError::parse(Self::FORMAT, e.to_string()))?;

        let mut object = Map::new();
        for (key, value) in pairs {
            match object.get_mut(&key) {
                Some(Value::Array(values)) => values.push(Value::String(value)),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value)]);
                }
                None => {
                    object.insert(key, Value::String(value));
                }
            }
        }
        Ok(Value::Object(object))
    }

    fn encode(&self, value: &Value) -> Result<Bytes, FormatError> {
        let Value::Object(object) = value else {
            return Err(FormatError::encode(Self::FORMAT, "only objects can be form encoded"));
        };

        let mut pairs = Vec::with_capacity(object.len());
        for (key, member) in object {
            let nested = || FormatError::encode(Self::FORMAT, format!("field '{key}' is nested"));
            match member {
                Value::Array(items) => {
                    for item in items {
                        pairs.push((key.as_str(), Self::scalar(item).ok_or_else(nested)?));
                    }
                }
                other => pairs.push((key.as_str(), Self::scalar(other).ok_or_else(nested)?)),
            }
        }

        serde_urlencoded::to_string(pairs)
            .map(Bytes::from)
            .map_err(|e| FormatError::encode(Self::FORMAT, e.to_string()))
    }
}
