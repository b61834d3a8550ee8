//! The request handed to the dispatcher.
//!
//! A [`DispatchRequest`] bundles the raw HTTP parts with the route the host
//! already resolved. Resource plugins receive it read-only as the "raw
//! request" argument of every operation.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri};

use crate::context::RequestContext;
use crate::route::{RouteAttributes, RouteTarget};

/// A request with its resolved route.
///
/// # Example
///
/// ```
/// use courier_core::{DispatchRequest, RouteTarget};
/// use http::Method;
///
/// let request = DispatchRequest::builder(RouteTarget::new("node", "read"))
///     .method(Method::GET)
///     .uri("/node/7")
///     .attribute("id", "7")
///     .build();
///
/// assert_eq!(request.attribute("id"), Some("7"));
/// assert!(request.body().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    route: RouteTarget,
    attributes: RouteAttributes,
    context: RequestContext,
}

impl DispatchRequest {
    /// Starts building a request for the given route.
    #[must_use]
    pub fn builder(route: RouteTarget) -> DispatchRequestBuilder {
        DispatchRequestBuilder::new(route)
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns all request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the resolved route.
    #[must_use]
    pub const fn route(&self) -> &RouteTarget {
        &self.route
    }

    /// Returns all captured route attributes.
    #[must_use]
    pub const fn attributes(&self) -> &RouteAttributes {
        &self.attributes
    }

    /// Returns a captured route attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    /// Returns the request context.
    #[must_use]
    pub const fn context(&self) -> &RequestContext {
        &self.context
    }
}

/// Builder for [`DispatchRequest`].
#[derive(Debug, Clone)]
pub struct DispatchRequestBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    route: RouteTarget,
    attributes: RouteAttributes,
    context: Option<RequestContext>,
}

impl DispatchRequestBuilder {
    /// Creates a builder for a GET of `/` on the given route.
    #[must_use]
    pub fn new(route: RouteTarget) -> Self {
        Self {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            route,
            attributes: RouteAttributes::new(),
            context: None,
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request URI. Invalid URIs leave the current value in place.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        if let Ok(parsed) = uri.parse() {
            self.uri = parsed;
        }
        self
    }

    /// Sets an already parsed URI.
    #[must_use]
    pub fn parsed_uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// Adds a header. Invalid names or values are skipped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the `Content-Type` header.
    #[must_use]
    pub fn content_type(self, content_type: &str) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a captured route attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(name, value);
        self
    }

    /// Replaces all captured route attributes.
    #[must_use]
    pub fn attributes(mut self, attributes: RouteAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the request context.
    #[must_use]
    pub fn context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Builds the request. The context gains the route's plugin and
    /// operation.
    #[must_use]
    pub fn build(self) -> DispatchRequest {
        let context = self
            .context
            .unwrap_or_default()
            .with_plugin_id(self.route.plugin_id())
            .with_operation(self.route.operation());

        DispatchRequest {
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            body: self.body,
            route: self.route,
            attributes: self.attributes,
            context,
        }
    }
}
