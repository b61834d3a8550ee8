//! Format registry.
//!
//! The registry is both the serializer and the MIME resolver the dispatcher
//! consumes: codecs are addressed by format name, and a request
//! `Content-Type` resolves back to a format name.

use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::Value;

use crate::codec::{Codec, FormCodec, JsonCodec};
use crate::error::FormatError;

/// Codecs keyed by format name.
///
/// # Example
///
/// ```rust
/// use courier_format::FormatRegistry;
/// use serde_json::json;
///
/// let formats = FormatRegistry::with_defaults();
///
/// assert_eq!(formats.mime_type_for("hal_json"), Some("application/hal+json"));
/// assert_eq!(
///     formats.format_for_content_type("application/json; charset=utf-8"),
///     Some("json")
/// );
///
/// let value = formats.deserialize(br#"{"title":"Hello"}"#, "hal_json").unwrap();
/// assert_eq!(value, Some(json!({"title": "Hello"})));
/// assert_eq!(formats.deserialize(b"", "hal_json").unwrap(), None);
/// ```
#[derive(Clone, Default)]
pub struct FormatRegistry {
    codecs: IndexMap<String, Arc<dyn Codec>>,
}

impl FormatRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with `json`, `hal_json` and `form`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(JsonCodec::new());
        registry.register(JsonCodec::hal());
        registry.register(FormCodec);
        registry
    }

    /// Registers a codec, replacing any codec with the same format name.
    pub fn register(&mut self, codec: impl Codec + 'static) {
        let name = codec.format().to_string();
        tracing::debug!(format = %name, mime_type = codec.mime_type(), "Registered codec");
        self.codecs.insert(name, Arc::new(codec));
    }

    /// Returns the codec for a format.
    #[must_use]
    pub fn get(&self, format: &str) -> Option<&dyn Codec> {
        self.codecs.get(format).map(|codec| &**codec)
    }

    /// Returns true if a codec exists for the format.
    #[must_use]
    pub fn contains(&self, format: &str) -> bool {
        self.codecs.contains_key(format)
    }

    /// Returns the registered format names in registration order.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }

    /// Returns the MIME type for a format.
    #[must_use]
    pub fn mime_type_for(&self, format: &str) -> Option<&str> {
        self.get(format).map(Codec::mime_type)
    }

    /// Resolves a `Content-Type` header to a format name.
    ///
    /// Parameters such as `charset` are ignored. A bare format name such as
    /// `hal_json` is accepted as well.
    #[must_use]
    pub fn format_for_content_type(&self, content_type: &str) -> Option<&str> {
        let trimmed = content_type.trim();
        if let Some((name, _)) = self.codecs.get_key_value(trimmed) {
            return Some(name.as_str());
        }

        let parsed: mime::Mime = trimmed.parse().ok()?;
        let essence = parsed.essence_str();
        self.codecs
            .iter()
            .find(|(_, codec)| {
                codec
                    .mime_type()
                    .parse::<mime::Mime>()
                    .is_ok_and(|m| m.essence_str().eq_ignore_ascii_case(essence))
            })
            .map(|(name, _)| name.as_str())
    }

    /// Parses a raw body.
    ///
    /// An empty body yields `Ok(None)` without touching the codec.
    pub fn deserialize(&self, bytes: &[u8], format: &str) -> Result<Option<Value>, FormatError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        let codec = self
            .get(format)
            .ok_or_else(|| FormatError::unknown_format(Some(format)))?;
        codec.decode(bytes).map(Some)
    }

    /// Encodes a value.
    pub fn serialize(&self, value: &Value, format: &str) -> Result<Bytes, FormatError> {
        let codec = self
            .get(format)
            .ok_or_else(|| FormatError::unknown_format(Some(format)))?;
        codec.encode(value)
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.codecs.keys().collect::<Vec<_>>())
            .finish()
    }
}
