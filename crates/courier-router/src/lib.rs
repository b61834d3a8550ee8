//! Radix tree router for Courier.
//!
//! Maps `(method, path)` to a [`RouteTarget`] naming the resource plugin,
//! the operation and an optional fixed response format, and captures path
//! attributes for parameter binding.
//!
//! # Example
//!
//! ```rust
//! use courier_core::RouteTarget;
//! use courier_router::{MethodRouter, RouteLookup, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router
//!     .insert(
//!         "/node/{id}",
//!         MethodRouter::new()
//!             .get(RouteTarget::new("node", "read"))
//!             .delete(RouteTarget::new("node", "delete")),
//!     )
//!     .unwrap();
//!
//! match router.lookup(&Method::POST, "/node/1") {
//!     RouteLookup::MethodNotAllowed(methods) => assert_eq!(methods.allow_header(), "GET, DELETE"),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! # Layout
//!
//! ```text
//!              (root)
//!                │
//!             "node"          [GET index, POST create]
//!                │
//!              "{id}"         [GET read, PATCH update, DELETE delete]
//! ```

#![doc(html_root_url = "https://docs.rs/courier-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod method_router;
mod node;
mod router;

pub use courier_core::{RouteAttributes, RouteTarget};
pub use error::RouteError;
pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use router::Router;

/// A matched route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The resolved target.
    pub target: &'a RouteTarget,
    /// Attributes captured from the path.
    pub attributes: RouteAttributes,
}

impl<'a> RouteMatch<'a> {
    /// Creates a route match.
    #[must_use]
    pub fn new(target: &'a RouteTarget, attributes: RouteAttributes) -> Self {
        Self { target, attributes }
    }
}

/// Outcome of [`Router::lookup`].
#[derive(Debug, Clone)]
pub enum RouteLookup<'a> {
    /// Path and method matched.
    Found(RouteMatch<'a>),
    /// The path matched but the method is not routed on it.
    MethodNotAllowed(&'a MethodRouter),
    /// No pattern matched the path.
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_match_new() {
        let target = RouteTarget::new("node", "read");
        let attributes: RouteAttributes = [("id", "1")].into_iter().collect();
        let found = RouteMatch::new(&target, attributes);
        assert_eq!(found.target.operation(), "read");
        assert_eq!(found.attributes.get("id"), Some("1"));
    }
}
