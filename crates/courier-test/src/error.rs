//! Test client errors.

use thiserror::Error;

/// Errors raised while building a request or reading a response.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request could not be built.
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// The response body is not what was asked for.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
