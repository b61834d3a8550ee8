//! Router API.

use courier_core::{RouteAttributes, RouteTarget};
use http::Method;

use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::{RouteLookup, RouteMatch};

/// Resolves `(method, path)` to the resource operation that serves it.
///
/// # Route Priority
///
/// 1. Static segments (`/node/latest`)
/// 2. Parameter segments (`/node/{id}`)
/// 3. Wildcard segments (`/files/*path`)
///
/// # Example
///
/// ```rust
/// use courier_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.resource("/node", Method::POST, "node", "create", Some("hal_json")).unwrap();
/// router.resource("/node/{id}", Method::GET, "node", "read", None).unwrap();
///
/// let found = router.match_route(&Method::GET, "/node/42").unwrap();
/// assert_eq!(found.target.plugin_id(), "node");
/// assert_eq!(found.target.operation(), "read");
/// assert_eq!(found.attributes.get("id"), Some("42"));
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    root: Node,
    route_count: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Inserts a path pattern with its method table. Tables for the same
    /// pattern are merged; methods registered first win.
    pub fn insert(&mut self, pattern: &str, methods: MethodRouter) -> Result<(), RouteError> {
        self.root.insert(pattern, methods)?;
        self.route_count += 1;
        Ok(())
    }

    /// Registers a single method on a pattern.
    pub fn route(
        &mut self,
        method: Method,
        pattern: &str,
        target: RouteTarget,
    ) -> Result<(), RouteError> {
        self.insert(pattern, MethodRouter::new().method(method, target))
    }

    /// Registers a resource operation, optionally fixing its response format.
    pub fn resource(
        &mut self,
        pattern: &str,
        method: Method,
        plugin_id: &str,
        operation: &str,
        format: Option<&str>,
    ) -> Result<(), RouteError> {
        let target = match format {
            Some(format) => RouteTarget::new(plugin_id, operation).with_format(format),
            None => RouteTarget::new(plugin_id, operation),
        };
        self.route(method, pattern, target)
    }

    /// Matches a method and path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let (methods, attributes) = self.match_path(path)?;
        let target = methods.target(method)?;
        Some(RouteMatch::new(target, attributes))
    }

    /// Matches a path regardless of method.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter, RouteAttributes)> {
        let mut attributes = RouteAttributes::new();
        let methods = self.root.match_path(path, &mut attributes)?;
        Some((methods, attributes))
    }

    /// Classifies a request as found, method-not-allowed or not found.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_> {
        match self.match_path(path) {
            None => RouteLookup::NotFound,
            Some((methods, attributes)) => match methods.target(method) {
                Some(target) => RouteLookup::Found(RouteMatch::new(target, attributes)),
                None => RouteLookup::MethodNotAllowed(methods),
            },
        }
    }

    /// Returns the methods routed for `path`, empty when the path is unknown.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.match_path(path)
            .map(|(methods, _)| methods.allowed_methods())
            .unwrap_or_default()
    }

    /// Returns the number of inserted patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if nothing was inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
