//! Server errors.

use thiserror::Error;

/// Errors raised while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is not a socket address.
    #[error("Invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Why it failed to parse.
        reason: String,
    },

    /// The listener could not be bound.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = ServerError::Bind {
            addr: "127.0.0.1:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "Failed to bind to 127.0.0.1:80: denied");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_from() {
        let err: ServerError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, ServerError::Io(_)));
    }
}
