//! Per-path method table.
//!
//! A [`MethodRouter`] maps HTTP methods to the [`RouteTarget`] that serves
//! them on a single path pattern.

use courier_core::RouteTarget;
use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to route targets for one path.
///
/// # Example
///
/// ```rust
/// use courier_core::RouteTarget;
/// use courier_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new()
///     .get(RouteTarget::new("node", "read"))
///     .patch(RouteTarget::new("node", "update").with_format("hal_json"));
///
/// assert_eq!(router.target(&Method::GET).map(RouteTarget::operation), Some("read"));
/// assert!(router.target(&Method::DELETE).is_none());
/// assert_eq!(router.allow_header(), "GET, PATCH");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    entries: SmallVec<[(Method, RouteTarget); 4]>,
}

impl MethodRouter {
    /// Creates an empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a target for any method. A method registered twice keeps
    /// its latest target.
    #[must_use]
    pub fn method(mut self, method: Method, target: RouteTarget) -> Self {
        self.set(method, target);
        self
    }

    /// Registers a GET target.
    #[must_use]
    pub fn get(self, target: RouteTarget) -> Self {
        self.method(Method::GET, target)
    }

    /// Registers a POST target.
    #[must_use]
    pub fn post(self, target: RouteTarget) -> Self {
        self.method(Method::POST, target)
    }

    /// Registers a PUT target.
    #[must_use]
    pub fn put(self, target: RouteTarget) -> Self {
        self.method(Method::PUT, target)
    }

    /// Registers a PATCH target.
    #[must_use]
    pub fn patch(self, target: RouteTarget) -> Self {
        self.method(Method::PATCH, target)
    }

    /// Registers a DELETE target.
    #[must_use]
    pub fn delete(self, target: RouteTarget) -> Self {
        self.method(Method::DELETE, target)
    }

    fn set(&mut self, method: Method, target: RouteTarget) {
        if let Some(entry) = self.entries.iter_mut().find(|(m, _)| *m == method) {
            entry.1 = target;
        } else {
            self.entries.push((method, target));
        }
    }

    /// Returns the target registered for `method`.
    #[must_use]
    pub fn target(&self, method: &Method) -> Option<&RouteTarget> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, target)| target)
    }

    /// Merges another method router into this one.
    ///
    /// Methods already registered here keep their target.
    pub fn merge(&mut self, other: MethodRouter) {
        for (method, target) in other.entries {
            if self.target(&method).is_none() {
                self.entries.push((method, target));
            }
        }
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the registered methods in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns the value of an `Allow` header for this path.
    #[must_use]
    pub fn allow_header(&self) -> String {
        self.entries
            .iter()
            .map(|(m, _)| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Iterates over `(method, target)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &RouteTarget)> {
        self.entries.iter().map(|(m, t)| (m, t))
    }
}
