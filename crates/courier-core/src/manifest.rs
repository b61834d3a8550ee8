//! Operation metadata and parameter manifests.
//!
//! Each operation of a resource plugin declares where its parameters come
//! from. The declaration is static and validated when the plugin is
//! registered, so a manifest naming an unsupported location never reaches
//! the dispatcher.
//!
//! An operation that declares no parameter list at all is distinct from one
//! that declares an empty list: the first binds no argument set, the second
//! binds an empty one.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a parameter's value is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// A path attribute captured by route matching.
    Uri,
    /// A field of the deserialized request body.
    Body,
}

impl ParameterLocation {
    /// Returns the lowercase name of the location.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uri => "uri",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterLocation {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uri" => Ok(Self::Uri),
            "body" => Ok(Self::Body),
            other => Err(ManifestError::UnsupportedLocation {
                parameter: None,
                location: other.to_string(),
            }),
        }
    }
}

/// Ordered mapping of parameter name to source location.
pub type ParameterManifest = IndexMap<String, ParameterLocation>;

/// Errors raised while declaring operation metadata.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// A parameter names a location other than `uri` or `body`.
    #[error("unsupported parameter location '{location}'{}", .parameter.as_deref().map(|p| format!(" for parameter '{p}'")).unwrap_or_default())]
    UnsupportedLocation {
        /// The parameter, when known.
        parameter: Option<String>,
        /// The rejected location.
        location: String,
    },

    /// A parameter name is declared twice for one operation.
    #[error("parameter '{parameter}' is declared more than once on operation '{operation}'")]
    DuplicateParameter {
        /// The operation name.
        operation: String,
        /// The repeated parameter name.
        parameter: String,
    },

    /// An operation name is declared twice for one plugin.
    #[error("operation '{operation}' is declared more than once")]
    DuplicateOperation {
        /// The repeated operation name.
        operation: String,
    },

    /// An operation or parameter name is empty.
    #[error("empty {what} name")]
    EmptyName {
        /// What was unnamed ("operation" or "parameter").
        what: &'static str,
    },
}

/// Static description of one operation on a resource plugin.
///
/// # Example
///
/// ```
/// use courier_core::{OperationMetadata, ParameterLocation};
///
/// let update = OperationMetadata::builder("update")
///     .uri("id")
///     .body("title")
///     .build()
///     .unwrap();
///
/// let parameters = update.parameters().unwrap();
/// assert_eq!(parameters.get("id"), Some(&ParameterLocation::Uri));
/// assert_eq!(parameters.get("title"), Some(&ParameterLocation::Body));
///
/// // No declared list at all.
/// assert!(OperationMetadata::new("ping").parameters().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMetadata {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parameters: Option<ParameterManifest>,
}

impl OperationMetadata {
    /// Creates metadata for an operation that declares no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: None,
        }
    }

    /// Starts building metadata for an operation.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> OperationMetadataBuilder {
        OperationMetadataBuilder {
            name: name.into(),
            parameters: None,
        }
    }

    /// Builds metadata from `(parameter, location)` string pairs.
    ///
    /// Fails on locations other than `uri` and `body`.
    ///
    /// # Example
    ///
    /// ```
    /// use courier_core::OperationMetadata;
    ///
    /// assert!(OperationMetadata::from_declaration("read", &[("id", "uri")]).is_ok());
    /// assert!(OperationMetadata::from_declaration("read", &[("id", "query")]).is_err());
    /// ```
    pub fn from_declaration(
        name: impl Into<String>,
        parameters: &[(&str, &str)],
    ) -> Result<Self, ManifestError> {
        let mut builder = Self::builder(name).declare_parameters();
        for (parameter, location) in parameters {
            let location = location.parse::<ParameterLocation>().map_err(|_| {
                ManifestError::UnsupportedLocation {
                    parameter: Some((*parameter).to_string()),
                    location: (*location).to_string(),
                }
            })?;
            builder = builder.parameter(*parameter, location);
        }
        builder.build()
    }

    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared parameters, or `None` if the operation declares
    /// no parameter list.
    #[must_use]
    pub fn parameters(&self) -> Option<&ParameterManifest> {
        self.parameters.as_ref()
    }

    /// Checks names and parameter uniqueness.
    ///
    /// Metadata from the builder is already valid; this covers metadata that
    /// was deserialized from configuration.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.is_empty() {
            return Err(ManifestError::EmptyName { what: "operation" });
        }
        if let Some(parameters) = &self.parameters {
            if parameters.keys().any(String::is_empty) {
                return Err(ManifestError::EmptyName { what: "parameter" });
            }
        }
        Ok(())
    }
}

/// Checks that a plugin's operations are individually valid and uniquely
/// named.
pub fn validate_operations(operations: &[OperationMetadata]) -> Result<(), ManifestError> {
    let mut seen = std::collections::HashSet::new();
    for operation in operations {
        operation.validate()?;
        if !seen.insert(operation.name()) {
            return Err(ManifestError::DuplicateOperation {
                operation: operation.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Builder for [`OperationMetadata`].
#[derive(Debug, Clone)]
pub struct OperationMetadataBuilder {
    name: String,
    parameters: Option<Vec<(String, ParameterLocation)>>,
}

impl OperationMetadataBuilder {
    /// Declares a parameter list, even if no parameter is added.
    #[must_use]
    pub fn declare_parameters(mut self) -> Self {
        self.parameters.get_or_insert_with(Vec::new);
        self
    }

    /// Declares a parameter.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, location: ParameterLocation) -> Self {
        self.parameters
            .get_or_insert_with(Vec::new)
            .push((name.into(), location));
        self
    }

    /// Declares a parameter read from a route attribute.
    #[must_use]
    pub fn uri(self, name: impl Into<String>) -> Self {
        self.parameter(name, ParameterLocation::Uri)
    }

    /// Declares a parameter read from a body field.
    #[must_use]
    pub fn body(self, name: impl Into<String>) -> Self {
        self.parameter(name, ParameterLocation::Body)
    }

    /// Builds the metadata.
    ///
    /// Fails on empty names or a parameter declared twice.
    pub fn build(self) -> Result<OperationMetadata, ManifestError> {
        if self.name.is_empty() {
            return Err(ManifestError::EmptyName { what: "operation" });
        }

        let parameters = match self.parameters {
            None => None,
            Some(declared) => {
                let mut manifest = ParameterManifest::with_capacity(declared.len());
                for (parameter, location) in declared {
                    if parameter.is_empty() {
                        return Err(ManifestError::EmptyName { what: "parameter" });
                    }
                    if manifest.contains_key(&parameter) {
                        return Err(ManifestError::DuplicateParameter {
                            operation: self.name,
                            parameter,
                        });
                    }
                    manifest.insert(parameter, location);
                }
                Some(manifest)
            }
        };

        Ok(OperationMetadata {
            name: self.name,
            parameters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse() {
        assert_eq!("uri".parse::<ParameterLocation>(), Ok(ParameterLocation::Uri));
        assert_eq!("body".parse::<ParameterLocation>(), Ok(ParameterLocation::Body));
        assert!("query".parse::<ParameterLocation>().is_err());
        assert!("URI".parse::<ParameterLocation>().is_err());
    }

    #[test]
    fn test_location_display() {
        assert_eq!(ParameterLocation::Uri.to_string(), "uri");
        assert_eq!(ParameterLocation::Body.to_string(), "body");
    }

    #[test]
    fn test_builder_preserves_order() {
        let metadata = OperationMetadata::builder("update")
            .uri("id")
            .body("title")
            .body("status")
            .build()
            .unwrap();

        let names: Vec<_> = metadata.parameters().unwrap().keys().cloned().collect();
        assert_eq!(names, vec!["id", "title", "status"]);
    }

    #[test]
    fn test_absent_and_empty_lists_differ() {
        let absent = OperationMetadata::builder("index").build().unwrap();
        let empty = OperationMetadata::builder("index")
            .declare_parameters()
            .build()
            .unwrap();

        assert!(absent.parameters().is_none());
        assert_eq!(empty.parameters().map(IndexMap::len), Some(0));
        assert_ne!(absent, empty);
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let result = OperationMetadata::builder("update").uri("id").body("id").build();
        assert_eq!(
            result,
            Err(ManifestError::DuplicateParameter {
                operation: "update".to_string(),
                parameter: "id".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_names_rejected() {
        assert!(OperationMetadata::builder("").build().is_err());
        assert!(OperationMetadata::builder("read").uri("").build().is_err());
    }

    #[test]
    fn test_from_declaration_rejects_unknown_location() {
        let err = OperationMetadata::from_declaration("search", &[("q", "query")]).unwrap_err();
        assert_eq!(
            err,
            ManifestError::UnsupportedLocation {
                parameter: Some("q".to_string()),
                location: "query".to_string(),
            }
        );
        assert!(err.to_string().contains("'q'"));
    }

    #[test]
    fn test_from_declaration_with_no_pairs_declares_empty_list() {
        let metadata = OperationMetadata::from_declaration("index", &[]).unwrap();
        assert!(metadata.parameters().unwrap().is_empty());
    }

    #[test]
    fn test_deserialize_rejects_unknown_location() {
        let json = r#"{"name": "read", "parameters": {"id": "header"}}"#;
        assert!(serde_json::from_str::<OperationMetadata>(json).is_err());

        let json = r#"{"name": "read", "parameters": {"id": "uri"}}"#;
        let metadata: OperationMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(
            metadata.parameters().unwrap().get("id"),
            Some(&ParameterLocation::Uri)
        );
    }

    #[test]
    fn test_deserialize_without_parameters() {
        let metadata: OperationMetadata = serde_json::from_str(r#"{"name": "ping"}"#).unwrap();
        assert!(metadata.parameters().is_none());
    }

    #[test]
    fn test_validate_operations_duplicates() {
        let operations = vec![OperationMetadata::new("read"), OperationMetadata::new("read")];
        assert_eq!(
            validate_operations(&operations),
            Err(ManifestError::DuplicateOperation {
                operation: "read".to_string()
            })
        );

        let operations = vec![OperationMetadata::new("read"), OperationMetadata::new("create")];
        assert!(validate_operations(&operations).is_ok());
    }
}
