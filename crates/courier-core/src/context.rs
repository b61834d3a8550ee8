//! Request context types.
//!
//! The [`RequestContext`] carries per-request identity and timing through the
//! dispatch pipeline and into resource plugins.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines for a request sortable.
///
/// # Example
///
/// ```
/// use courier_core::RequestId;
///
/// let id = RequestId::new();
/// assert_ne!(id, RequestId::new());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses a request ID from an inbound header value.
    ///
    /// Returns `None` if the value is not a UUID.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request context.
///
/// Created by the host when a request arrives; the dispatcher fills in the
/// plugin and operation once the route is known.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    plugin_id: Option<String>,
    operation: Option<String>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a new context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a new context with the given request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            plugin_id: None,
            operation: None,
            started_at: Instant::now(),
        }
    }

    /// Sets the resource plugin this request targets.
    #[must_use]
    pub fn with_plugin_id(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = Some(plugin_id.into());
        self
    }

    /// Sets the operation this request targets.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the targeted plugin, if known.
    #[must_use]
    pub fn plugin_id(&self) -> Option<&str> {
        self.plugin_id.as_deref()
    }

    /// Returns the targeted operation, if known.
    #[must_use]
    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    /// Returns the time elapsed since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_request_id_parse() {
        let id = RequestId::new();
        assert_eq!(RequestId::parse(&id.to_string()), Some(id));
        assert_eq!(RequestId::parse("not-a-uuid"), None);
    }

    #[test]
    fn test_request_id_serialization() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_context_builders() {
        let ctx = RequestContext::new()
            .with_plugin_id("node")
            .with_operation("create");

        assert_eq!(ctx.plugin_id(), Some("node"));
        assert_eq!(ctx.operation(), Some("create"));
    }

    #[test]
    fn test_context_with_request_id() {
        let id = RequestId::new();
        let ctx = RequestContext::with_request_id(id);
        assert_eq!(ctx.request_id(), id);
        assert!(ctx.plugin_id().is_none());
        assert!(ctx.elapsed() < Duration::from_secs(5));
    }
}
