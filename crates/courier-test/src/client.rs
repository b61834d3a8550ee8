//! In-memory client.

use std::sync::Arc;

use bytes::Bytes;
use courier_server::Server;
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, Method, Request};

use crate::error::TestError;
use crate::response::TestResponse;

/// Sends requests straight into a [`Server`] without a socket.
#[derive(Debug, Clone)]
#[must_use]
pub struct TestClient {
    server: Arc<Server>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for `server`.
    pub fn new(server: Server) -> Self {
        Self::from_shared(Arc::new(server))
    }

    /// Creates a client for a server that is also used elsewhere.
    pub fn from_shared(server: Arc<Server>) -> Self {
        Self {
            server,
            default_headers: Vec::new(),
        }
    }

    /// Returns the server under test.
    #[must_use]
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Starts a GET request.
    pub fn get(&self, uri: impl Into<String>) -> TestRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a POST request.
    pub fn post(&self, uri: impl Into<String>) -> TestRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a PUT request.
    pub fn put(&self, uri: impl Into<String>) -> TestRequest<'_> {
        self.request(Method::PUT, uri)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, uri: impl Into<String>) -> TestRequest<'_> {
        self.request(Method::PATCH, uri)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, uri: impl Into<String>) -> TestRequest<'_> {
        self.request(Method::DELETE, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl Into<String>) -> TestRequest<'_> {
        let headers = self.default_headers.clone();
        TestRequest {
            client: self,
            method,
            uri: uri.into(),
            headers,
            body: Bytes::new(),
            error: None,
        }
    }
}

/// A request being built by a [`TestClient`].
#[must_use]
pub struct TestRequest<'a> {
    client: &'a TestClient,
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequest<'_> {
    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets `Content-Type`.
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header(CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body with `Content-Type: application/json`.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.body = Bytes::from(body);
                self.content_type("application/json")
            }
            Err(e) => {
                self.error = Some(TestError::Json(e));
                self
            }
        }
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("test request failed: {e}"),
        }
    }

    /// Sends the request, returning build errors.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let mut request = Request::builder()
            .method(self.method)
            .uri(self.uri.as_str())
            .body(self.body)
            .map_err(|e| TestError::RequestBuild(e.to_string()))?;
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TestError::RequestBuild(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TestError::RequestBuild(format!("header {name}: {e}")))?;
            request.headers_mut().append(name, value);
        }
        let response = self.client.server.respond(request).await;
        Ok(TestResponse::from_response(response))
    }
}
