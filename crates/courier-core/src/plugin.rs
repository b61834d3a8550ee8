//! The resource plugin capability.

use async_trait::async_trait;

use crate::arguments::ArgumentSet;
use crate::error::DispatchResult;
use crate::manifest::OperationMetadata;
use crate::request::DispatchRequest;
use crate::result::OperationResult;
use crate::value::StructuredBody;

/// A REST resource exposing named operations.
///
/// Implementations declare their operations statically through
/// [`operations`](ResourcePlugin::operations); the dispatcher only invokes
/// names that appear there.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use courier_core::{
///     ArgumentSet, DispatchError, DispatchRequest, DispatchResult, OperationMetadata,
///     OperationResult, ResourcePlugin, StructuredBody,
/// };
/// use serde_json::json;
///
/// struct Greeting {
///     operations: Vec<OperationMetadata>,
/// }
///
/// #[async_trait]
/// impl ResourcePlugin for Greeting {
///     fn id(&self) -> &str {
///         "greeting"
///     }
///
///     fn operations(&self) -> &[OperationMetadata] {
///         &self.operations
///     }
///
///     async fn invoke(
///         &self,
///         operation: &str,
///         arguments: Option<ArgumentSet>,
///         _body: Option<&StructuredBody>,
///         _request: &DispatchRequest,
///     ) -> DispatchResult<OperationResult> {
///         match operation {
///             "read" => {
///                 let name = arguments
///                     .as_ref()
///                     .and_then(|a| a.get_str("name"))
///                     .unwrap_or("world");
///                 Ok(OperationResult::ok(json!({ "greeting": format!("hello {name}") })))
///             }
///             other => Err(DispatchError::operation_not_found(self.id(), other)),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait ResourcePlugin: Send + Sync {
    /// The identifier routes use to address this plugin.
    fn id(&self) -> &str;

    /// The operations this plugin exposes.
    fn operations(&self) -> &[OperationMetadata];

    /// Returns the metadata of one operation.
    fn operation_metadata(&self, operation: &str) -> Option<&OperationMetadata> {
        self.operations().iter().find(|op| op.name() == operation)
    }

    /// Returns the names of all operations.
    fn list_operations(&self) -> Vec<&str> {
        self.operations().iter().map(OperationMetadata::name).collect()
    }

    /// Invokes an operation.
    ///
    /// `arguments` is `None` when the operation declares no parameter list.
    /// `body` is `None` when the request carried no body.
    async fn invoke(
        &self,
        operation: &str,
        arguments: Option<ArgumentSet>,
        body: Option<&StructuredBody>,
        request: &DispatchRequest,
    ) -> DispatchResult<OperationResult>;
}
