//! Route registration errors.

use thiserror::Error;

/// An invalid route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A `*wildcard` segment was followed by more segments.
    #[error("wildcard must be the last segment in '{pattern}'")]
    WildcardNotLast {
        /// The offending pattern.
        pattern: String,
    },

    /// Two patterns declare different names for the same parameter position.
    #[error("parameter '{{{new}}}' in '{pattern}' conflicts with existing '{{{existing}}}'")]
    ConflictingParameter {
        /// The offending pattern.
        pattern: String,
        /// The name already registered at this position.
        existing: String,
        /// The name this pattern tried to register.
        new: String,
    },

    /// A `{}` or `*` segment without a name.
    #[error("unnamed capture segment in '{pattern}'")]
    UnnamedCapture {
        /// The offending pattern.
        pattern: String,
    },
}
