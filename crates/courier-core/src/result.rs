//! Operation results.

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

/// The value an operation returns on success.
///
/// A result carries a status, headers and an optional payload. Results
/// without a payload (or with a `null` payload) pass through the response
/// serializer untouched, which is how 204 and redirect style outcomes are
/// expressed.
///
/// # Example
///
/// ```
/// use courier_core::OperationResult;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let created = OperationResult::created(json!({"id": 1}));
/// assert_eq!(created.status(), StatusCode::CREATED);
/// assert!(created.has_payload());
///
/// let deleted = OperationResult::no_content();
/// assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
/// assert!(!deleted.has_payload());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    status: StatusCode,
    headers: HeaderMap,
    payload: Option<Value>,
}

impl OperationResult {
    /// A 200 result carrying a payload.
    #[must_use]
    pub fn ok(payload: Value) -> Self {
        Self::with_payload(StatusCode::OK, payload)
    }

    /// A 201 result carrying a payload.
    #[must_use]
    pub fn created(payload: Value) -> Self {
        Self::with_payload(StatusCode::CREATED, payload)
    }

    /// A 204 result without a payload.
    #[must_use]
    pub fn no_content() -> Self {
        Self::empty(StatusCode::NO_CONTENT)
    }

    /// A result with the given status and payload.
    #[must_use]
    pub fn with_payload(status: StatusCode, payload: Value) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            payload: Some(payload),
        }
    }

    /// A result with the given status and no payload.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            payload: None,
        }
    }

    /// Overrides the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers set by the operation.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the payload, treating `null` as absent.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref().filter(|value| !value.is_null())
    }

    /// Returns true if there is a payload to serialize.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.payload().is_some()
    }

    /// Splits the result into status, headers and payload.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Option<Value>) {
        let payload = self.payload.filter(|value| !value.is_null());
        (self.status, self.headers, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_result() {
        let result = OperationResult::ok(json!({"title": "Hello"}));
        assert_eq!(result.status(), StatusCode::OK);
        assert_eq!(result.payload(), Some(&json!({"title": "Hello"})));
    }

    #[test]
    fn test_null_payload_is_absent() {
        let result = OperationResult::ok(Value::Null);
        assert!(!result.has_payload());
        let (_, _, payload) = result.into_parts();
        assert!(payload.is_none());
    }

    #[test]
    fn test_empty_array_is_a_payload() {
        let result = OperationResult::ok(json!([]));
        assert!(result.has_payload());
    }

    #[test]
    fn test_headers_and_status_override() {
        let result = OperationResult::empty(StatusCode::SEE_OTHER)
            .with_header(
                http::header::LOCATION,
                HeaderValue::from_static("/node/1"),
            )
            .with_status(StatusCode::FOUND);

        assert_eq!(result.status(), StatusCode::FOUND);
        assert_eq!(result.headers().get("location").unwrap(), "/node/1");
        assert!(!result.has_payload());
    }
}
