//! Body deserializer.
//!
//! Turns the raw request payload into a [`StructuredBody`] using the format
//! named by the request `Content-Type`. An empty payload is absent, never an
//! empty structure, and a parse failure is always an error.

use std::sync::Arc;

use courier_core::{DispatchError, DispatchRequest, DispatchResult, StructuredBody};
use courier_format::FormatRegistry;

/// Parses request bodies.
#[derive(Debug, Clone)]
pub struct BodyDeserializer {
    formats: Arc<FormatRegistry>,
    max_body_bytes: usize,
}

impl BodyDeserializer {
    /// Creates a deserializer accepting bodies up to `max_body_bytes`.
    #[must_use]
    pub fn new(formats: Arc<FormatRegistry>, max_body_bytes: usize) -> Self {
        Self {
            formats,
            max_body_bytes,
        }
    }

    /// Returns the body size limit.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Resolves the request body format from the `Content-Type` header.
    #[must_use]
    pub fn request_format<'a>(&'a self, request: &DispatchRequest) -> Option<&'a str> {
        request
            .content_type()
            .and_then(|content_type| self.formats.format_for_content_type(content_type))
    }

    /// Rejects bodies over the size limit.
    pub fn check_size(&self, len: usize) -> DispatchResult<()> {
        if len > self.max_body_bytes {
            return Err(DispatchError::payload_too_large(self.max_body_bytes, len));
        }
        Ok(())
    }

    /// Parses `raw` in `format`.
    ///
    /// Returns `Ok(None)` for an empty payload without consulting the
    /// format. A non-empty payload without a format fails with
    /// [`DispatchError::UnsupportedFormat`].
    pub fn deserialize(
        &self,
        raw: &[u8],
        format: Option<&str>,
    ) -> DispatchResult<Option<StructuredBody>> {
        if raw.is_empty() {
            return Ok(None);
        }
        self.check_size(raw.len())?;

        let format = format.ok_or_else(|| DispatchError::unsupported_format(None))?;
        let value = self.formats.deserialize(raw, format).map_err(|e| {
            tracing::debug!(format, error = %e, "Request body rejected");
            DispatchError::from(e)
        })?;
        Ok(value.map(StructuredBody::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{BodyKind, ErrorCategory, RouteTarget};
    use http::StatusCode;
    use serde_json::json;

    fn deserializer() -> BodyDeserializer {
        BodyDeserializer::new(Arc::new(FormatRegistry::with_defaults()), 64)
    }

    #[test]
    fn test_empty_body_is_absent() {
        let body = deserializer().deserialize(b"", Some("json")).unwrap();
        assert!(body.is_none());
        // The format is irrelevant when there is nothing to parse.
        assert!(deserializer().deserialize(b"", None).unwrap().is_none());
    }

    #[test]
    fn test_parses_object() {
        let body = deserializer()
            .deserialize(br#"{"title":"Hello"}"#, Some("hal_json"))
            .unwrap()
            .unwrap();
        assert_eq!(body.kind(), BodyKind::Object);
        assert_eq!(body.field("title"), Some(&json!("Hello")));
    }

    #[test]
    fn test_parses_form() {
        let body = deserializer()
            .deserialize(b"title=Hello&tag=a&tag=b", Some("form"))
            .unwrap()
            .unwrap();
        assert_eq!(body.field("title"), Some(&json!("Hello")));
        assert_eq!(body.field("tag"), Some(&json!(["a", "b"])));
    }

    #[test]
    fn test_parse_failure_is_observable() {
        let err = deserializer()
            .deserialize(br#"{"title": "Hel"#, Some("json"))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Deserialization);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.client_message().is_empty());
    }

    #[test]
    fn test_missing_or_unknown_format() {
        let err = deserializer().deserialize(b"x", None).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let err = deserializer().deserialize(b"x", Some("yaml")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn test_size_limit() {
        let raw = vec![b' '; 65];
        let err = deserializer().deserialize(&raw, Some("json")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(deserializer().check_size(64).is_ok());
    }

    #[test]
    fn test_request_format() {
        let deserializer = deserializer();
        let route = RouteTarget::new("node", "create");

        let request = DispatchRequest::builder(route.clone())
            .content_type("application/hal+json; charset=utf-8")
            .build();
        assert_eq!(deserializer.request_format(&request), Some("hal_json"));

        let request = DispatchRequest::builder(route.clone())
            .content_type("hal_json")
            .build();
        assert_eq!(deserializer.request_format(&request), Some("hal_json"));

        let request = DispatchRequest::builder(route.clone())
            .content_type("text/plain")
            .build();
        assert_eq!(deserializer.request_format(&request), None);

        let request = DispatchRequest::builder(route).build();
        assert_eq!(deserializer.request_format(&request), None);
    }
}
