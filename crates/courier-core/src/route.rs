//! Route targets and captured route attributes.
//!
//! A [`RouteTarget`] is what the router resolves a request to: a resource
//! plugin, one of its operations, and optionally a fixed response format.
//! [`RouteAttributes`] holds the values captured from the path pattern.

use smallvec::SmallVec;

/// Number of attributes stored inline before spilling to the heap.
const INLINE_ATTRIBUTES: usize = 4;

/// The resolved destination of a route.
///
/// # Example
///
/// ```
/// use courier_core::RouteTarget;
///
/// let target = RouteTarget::new("node", "create").with_format("hal_json");
/// assert_eq!(target.plugin_id(), "node");
/// assert_eq!(target.response_format("json"), "hal_json");
///
/// let target = RouteTarget::new("node", "read");
/// assert_eq!(target.response_format("json"), "json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteTarget {
    plugin_id: String,
    operation: String,
    format: Option<String>,
}

impl RouteTarget {
    /// Creates a route target without a fixed format.
    #[must_use]
    pub fn new(plugin_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            operation: operation.into(),
            format: None,
        }
    }

    /// Fixes the response format for this route.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Returns the resource plugin identifier.
    #[must_use]
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Returns the operation name.
    #[must_use]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the fixed format requirement, if any.
    #[must_use]
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Returns the format used for the response: the route's fixed format,
    /// or `default` when the route has none.
    #[must_use]
    pub fn response_format<'a>(&'a self, default: &'a str) -> &'a str {
        match self.format.as_deref() {
            Some(format) if !format.is_empty() => format,
            _ => default,
        }
    }
}

/// Attributes captured by route matching, as (name, value) pairs.
///
/// # Example
///
/// ```
/// use courier_core::RouteAttributes;
///
/// let mut attributes = RouteAttributes::new();
/// attributes.push("id", "42");
///
/// assert_eq!(attributes.get("id"), Some("42"));
/// assert_eq!(attributes.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteAttributes {
    inner: SmallVec<[(String, String); INLINE_ATTRIBUTES]>,
}

impl RouteAttributes {
    /// Creates an empty attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a captured attribute.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the value of an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if no attributes were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Drops attributes beyond `len`. Used when route matching backtracks.
    pub fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    /// Returns an iterator over (name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for RouteAttributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RouteAttributes {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }
}
