//! Plugin registration errors.

use courier_core::ManifestError;
use thiserror::Error;

/// Errors raised while registering resource plugins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A plugin with the same id is already registered.
    #[error("resource plugin '{plugin_id}' is already registered")]
    DuplicatePlugin {
        /// The repeated id.
        plugin_id: String,
    },

    /// The plugin id is empty.
    #[error("resource plugin id must not be empty")]
    EmptyId,

    /// The plugin declares an invalid operation manifest.
    #[error("resource plugin '{plugin_id}' has an invalid manifest: {source}")]
    InvalidManifest {
        /// The plugin id.
        plugin_id: String,
        /// What is wrong with the manifest.
        #[source]
        source: ManifestError,
    },
}

impl RegistryError {
    /// Creates a duplicate plugin error.
    #[must_use]
    pub fn duplicate(plugin_id: impl Into<String>) -> Self {
        Self::DuplicatePlugin {
            plugin_id: plugin_id.into(),
        }
    }

    /// Creates an invalid manifest error.
    #[must_use]
    pub fn invalid_manifest(plugin_id: impl Into<String>, source: ManifestError) -> Self {
        Self::InvalidManifest {
            plugin_id: plugin_id.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RegistryError::duplicate("node").to_string(),
            "resource plugin 'node' is already registered"
        );

        let err = RegistryError::invalid_manifest(
            "node",
            ManifestError::UnsupportedLocation {
                parameter: Some("q".to_string()),
                location: "query".to_string(),
            },
        );
        let message = err.to_string();
        assert!(message.contains("'node'"));
        assert!(message.contains("query"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
