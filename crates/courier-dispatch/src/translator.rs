//! Error translator.
//!
//! Every failure that ends a dispatch early becomes a `{"error": message}`
//! body encoded in the response format. Headers supplied by the error are
//! kept and win over the default `Content-Type`.

use std::sync::Arc;

use bytes::Bytes;
use courier_core::DispatchError;
use courier_format::{FormatRegistry, FALLBACK_FORMAT};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response};

const FALLBACK_MIME_TYPE: &str = "application/json";

/// Converts dispatch errors into responses.
#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    formats: Arc<FormatRegistry>,
}

impl ErrorTranslator {
    /// Creates a translator over a format registry.
    #[must_use]
    pub fn new(formats: Arc<FormatRegistry>) -> Self {
        Self { formats }
    }

    /// Builds the error response.
    ///
    /// Falls back to `json` when the payload cannot be encoded in `format`.
    #[must_use]
    pub fn translate(&self, error: &DispatchError, format: &str) -> Response<Bytes> {
        let payload = error.to_payload().to_value();
        let (body, mime_type) = self
            .encode(&payload, format)
            .or_else(|| {
                tracing::debug!(format, "Error payload falls back to {FALLBACK_FORMAT}");
                self.encode(&payload, FALLBACK_FORMAT)
            })
            .unwrap_or_else(|| {
                (
                    Bytes::from(payload.to_string()),
                    HeaderValue::from_static(FALLBACK_MIME_TYPE),
                )
            });

        let mut headers = error.headers().cloned().unwrap_or_default();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, mime_type);
        }

        let mut response = Response::new(body);
        *response.status_mut() = error.status_code();
        *response.headers_mut() = headers;
        response
    }

    fn encode(&self, payload: &serde_json::Value, format: &str) -> Option<(Bytes, HeaderValue)> {
        let mime_type = HeaderValue::from_str(self.formats.mime_type_for(format)?).ok()?;
        let body = self.formats.serialize(payload, format).ok()?;
        Some((body, mime_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderName, RETRY_AFTER};
    use http::StatusCode;
    use serde_json::json;

    fn translator() -> ErrorTranslator {
        ErrorTranslator::new(Arc::new(FormatRegistry::with_defaults()))
    }

    fn body(response: &Response<Bytes>) -> serde_json::Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn test_rejection_with_headers() {
        let error = DispatchError::forbidden("You may not edit this node").with_header(
            HeaderName::from_static("x-reason"),
            HeaderValue::from_static("forbidden"),
        );
        let response = translator().translate(&error, "hal_json");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()["x-reason"], "forbidden");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/hal+json");
        assert_eq!(body(&response), json!({"error": "You may not edit this node"}));
    }

    #[test]
    fn test_error_content_type_wins() {
        let error = DispatchError::rejection(StatusCode::SERVICE_UNAVAILABLE, "Maintenance")
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/problem+json"))
            .with_header(RETRY_AFTER, HeaderValue::from_static("120"));
        let response = translator().translate(&error, "json");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/problem+json");
        assert_eq!(response.headers()[RETRY_AFTER], "120");
    }

    #[test]
    fn test_status_per_category() {
        let translator = translator();
        let cases = [
            (DispatchError::unsupported_format(Some("xml")), 415),
            (DispatchError::deserialization("json", "expected value"), 400),
            (DispatchError::payload_too_large(10, 20), 413),
            (DispatchError::plugin_not_found("comment"), 404),
            (DispatchError::operation_not_found("node", "publish"), 404),
            (DispatchError::serialization("form", "nested"), 500),
        ];
        for (error, status) in cases {
            let response = translator.translate(&error, "json");
            assert_eq!(response.status().as_u16(), status);
            assert_eq!(body(&response)["error"], json!(error.client_message()));
        }
    }

    #[test]
    fn test_internal_message_hidden() {
        let error = DispatchError::internal("database password rejected");
        let response = translator().translate(&error, "json");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&response), json!({"error": "Internal server error"}));
    }

    #[test]
    fn test_unknown_format_falls_back_to_json() {
        let error = DispatchError::bad_request("Missing title");
        let response = translator().translate(&error, "xml");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(body(&response), json!({"error": "Missing title"}));
    }

    #[test]
    fn test_no_codecs_still_answers() {
        let translator = ErrorTranslator::new(Arc::new(FormatRegistry::new()));
        let response = translator.translate(&DispatchError::bad_request("Nope"), "hal_json");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], FALLBACK_MIME_TYPE);
        assert_eq!(body(&response), json!({"error": "Nope"}));
    }
}
