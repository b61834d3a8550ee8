//! Response wrapper with assertions.

use bytes::Bytes;
use http::{header, HeaderMap, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A collected response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Wraps a server response.
    #[must_use]
    pub fn from_response(response: Response<Bytes>) -> Self {
        let (parts, body) = response.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `Content-Type`.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Decodes the body as JSON. Works for `json` and `hal_json` bodies.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decodes the body as a JSON value.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Returns the message of an `{"error": ...}` body.
    pub fn error_message(&self) -> Result<String, TestError> {
        match self.json_value()?.get("error") {
            Some(serde_json::Value::String(message)) => Ok(message.clone()),
            _ => Err(TestError::BodyRead("no error message in body".to_string())),
        }
    }

    /// Asserts the status.
    ///
    /// # Panics
    ///
    /// Panics on mismatch.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {:?}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts a header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        match self.header(name) {
            Some(actual) => assert_eq!(actual, expected, "header {name}"),
            None => panic!("header {name} missing"),
        }
        self
    }

    /// Asserts `Content-Type`.
    ///
    /// # Panics
    ///
    /// Panics if the content type is missing or differs.
    pub fn assert_content_type(&self, expected: &str) -> &Self {
        self.assert_header(header::CONTENT_TYPE.as_str(), expected)
    }

    /// Asserts an `{"error": expected}` body.
    ///
    /// # Panics
    ///
    /// Panics if the body has no such message.
    pub fn assert_error(&self, expected: &str) -> &Self {
        match self.error_message() {
            Ok(message) => assert_eq!(message, expected),
            Err(e) => panic!("expected error body: {e}"),
        }
        self
    }
}
