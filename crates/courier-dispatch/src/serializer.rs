//! Response serializer.

use std::sync::Arc;

use bytes::Bytes;
use courier_core::{DispatchError, DispatchResult, OperationResult};
use courier_format::FormatRegistry;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Response};

/// Encodes operation results.
#[derive(Debug, Clone)]
pub struct ResponseSerializer {
    formats: Arc<FormatRegistry>,
}

impl ResponseSerializer {
    /// Creates a serializer over a format registry.
    #[must_use]
    pub fn new(formats: Arc<FormatRegistry>) -> Self {
        Self { formats }
    }

    /// Builds the response for an operation result.
    ///
    /// The result's status and headers are kept. A result without a payload
    /// passes through with an empty body and no added `Content-Type`;
    /// otherwise the payload is encoded in `format` and `Content-Type` is
    /// set to the format's MIME type.
    pub fn serialize(
        &self,
        result: OperationResult,
        format: &str,
    ) -> DispatchResult<Response<Bytes>> {
        let (status, headers, payload) = result.into_parts();

        let mut response = Response::new(Bytes::new());
        *response.status_mut() = status;
        *response.headers_mut() = headers;

        let Some(payload) = payload else {
            return Ok(response);
        };

        let (body, mime_type) = self.encode(&payload, format)?;
        *response.body_mut() = body;
        response.headers_mut().insert(CONTENT_TYPE, mime_type);
        Ok(response)
    }

    fn encode(
        &self,
        payload: &serde_json::Value,
        format: &str,
    ) -> DispatchResult<(Bytes, HeaderValue)> {
        let mime_type = self
            .formats
            .mime_type_for(format)
            .ok_or_else(|| DispatchError::serialization(format, "no codec is registered"))?;
        let mime_type = HeaderValue::from_str(mime_type)
            .map_err(|e| DispatchError::serialization(format, e.to_string()))?;

        let body = self
            .formats
            .serialize(payload, format)
            .map_err(|e| DispatchError::serialization(format, e.message()))?;
        Ok((body, mime_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::LOCATION;
    use http::StatusCode;
    use serde_json::json;

    fn serializer() -> ResponseSerializer {
        ResponseSerializer::new(Arc::new(FormatRegistry::with_defaults()))
    }

    #[test]
    fn test_payload_is_encoded() {
        let response = serializer()
            .serialize(OperationResult::created(json!({"id": 1})), "hal_json")
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/hal+json");
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({"id": 1}));
    }

    #[test]
    fn test_no_payload_passes_through() {
        let result = OperationResult::empty(StatusCode::SEE_OTHER)
            .with_header(LOCATION, HeaderValue::from_static("/node/1"));
        let response = serializer().serialize(result, "hal_json").unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/node/1");
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_null_payload_passes_through() {
        let response = serializer()
            .serialize(OperationResult::ok(serde_json::Value::Null), "json")
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_result_content_type_is_replaced() {
        let result = OperationResult::ok(json!({"a": 1}))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let response = serializer().serialize(result, "json").unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_unknown_format_is_serialization_error() {
        let err = serializer()
            .serialize(OperationResult::ok(json!({"a": 1})), "xml")
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(err, DispatchError::Serialization { .. }));
    }

    #[test]
    fn test_form_cannot_encode_nested() {
        let err = serializer()
            .serialize(OperationResult::ok(json!({"a": {"b": 1}})), "form")
            .unwrap_err();
        assert!(matches!(err, DispatchError::Serialization { .. }));
    }

    #[test]
    fn test_round_trip_through_registry() {
        let formats = FormatRegistry::with_defaults();
        let payload = json!({"title": "Hello", "tags": ["a"], "count": 2, "draft": null});
        let response = serializer()
            .serialize(OperationResult::ok(payload.clone()), "hal_json")
            .unwrap();
        let decoded = formats.deserialize(response.body(), "hal_json").unwrap();
        assert_eq!(decoded, Some(payload));
    }
}
