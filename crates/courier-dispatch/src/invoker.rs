//! Operation invoker.

use std::sync::Arc;

use courier_core::{
    ArgumentSet, DispatchError, DispatchRequest, DispatchResult, OperationMetadata,
    OperationResult, ResourcePlugin, StructuredBody,
};

use crate::registry::PluginRegistry;

/// Resolves plugins and calls their operations.
#[derive(Debug, Clone)]
pub struct OperationInvoker {
    registry: Arc<PluginRegistry>,
}

impl OperationInvoker {
    /// Creates an invoker over a registry.
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Returns an instance of the plugin, or
    /// [`DispatchError::PluginNotFound`].
    ///
    /// An instance whose id differs from `plugin_id`, which only a
    /// misbehaving factory can produce, is an internal error.
    pub fn resolve_plugin(&self, plugin_id: &str) -> DispatchResult<Arc<dyn ResourcePlugin>> {
        let plugin = self
            .registry
            .get_instance(plugin_id)
            .ok_or_else(|| DispatchError::plugin_not_found(plugin_id))?;
        if plugin.id() != plugin_id {
            return Err(DispatchError::internal(format!(
                "factory for plugin '{plugin_id}' built plugin '{}'",
                plugin.id()
            )));
        }
        Ok(plugin)
    }

    /// Returns the metadata of an operation, or
    /// [`DispatchError::OperationNotFound`].
    pub fn operation_metadata<'p>(
        plugin: &'p dyn ResourcePlugin,
        operation: &str,
    ) -> DispatchResult<&'p OperationMetadata> {
        plugin
            .operation_metadata(operation)
            .ok_or_else(|| DispatchError::operation_not_found(plugin.id(), operation))
    }

    /// Calls a declared operation.
    pub async fn invoke(
        &self,
        plugin: &dyn ResourcePlugin,
        operation: &str,
        arguments: Option<ArgumentSet>,
        body: Option<&StructuredBody>,
        request: &DispatchRequest,
    ) -> DispatchResult<OperationResult> {
        Self::operation_metadata(plugin, operation)?;

        let result = plugin.invoke(operation, arguments, body, request).await;
        if let Err(e) = &result {
            tracing::debug!(
                plugin = plugin.id(),
                operation,
                status = e.status_code().as_u16(),
                error = %e,
                "Operation raised an error"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::fixtures;
    use courier_core::{ErrorCategory, RouteTarget};
    use http::StatusCode;

    fn invoker() -> (OperationInvoker, Arc<dyn ResourcePlugin>) {
        let mut registry = PluginRegistry::new();
        registry.register(fixtures::node_resource()).unwrap();
        let invoker = OperationInvoker::new(Arc::new(registry));
        let plugin = invoker.resolve_plugin("node").unwrap();
        (invoker, plugin)
    }

    #[test]
    fn test_unknown_plugin() {
        let (invoker, _) = invoker();
        let err = invoker.resolve_plugin("comment").err().unwrap();
        assert_eq!(err.category(), ErrorCategory::Resolution);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_factory_instance_with_other_id() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let first = AtomicBool::new(true);
        let mut registry = PluginRegistry::new();
        registry
            .register_factory(move || {
                let id = if first.swap(false, Ordering::SeqCst) { "node" } else { "user" };
                fixtures::RecordingResource::new(id)
            })
            .unwrap();
        let invoker = OperationInvoker::new(Arc::new(registry));

        let err = invoker.resolve_plugin("node").err().unwrap();
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_operation_metadata() {
        let (_, plugin) = invoker();
        let read = OperationInvoker::operation_metadata(plugin.as_ref(), "read").unwrap();
        assert!(read.parameters().is_some());

        let err = OperationInvoker::operation_metadata(plugin.as_ref(), "publish").unwrap_err();
        assert!(matches!(err, DispatchError::OperationNotFound { .. }));
    }

    #[tokio::test]
    async fn test_invoke_passes_arguments() {
        let (invoker, plugin) = invoker();
        let request = DispatchRequest::builder(RouteTarget::new("node", "read")).build();
        let mut arguments = ArgumentSet::new();
        arguments.bind("id", Some(serde_json::json!("3")));

        let result = invoker
            .invoke(plugin.as_ref(), "read", Some(arguments), None, &request)
            .await
            .unwrap();
        assert_eq!(result.status(), StatusCode::OK);
        assert_eq!(
            result.payload().unwrap()["arguments"]["id"],
            serde_json::json!("3")
        );
    }

    #[tokio::test]
    async fn test_invoke_propagates_rejection() {
        let (invoker, plugin) = invoker();
        let request = DispatchRequest::builder(RouteTarget::new("node", "read")).build();
        let mut arguments = ArgumentSet::new();
        arguments.bind("id", Some(serde_json::json!("0")));

        let err = invoker
            .invoke(plugin.as_ref(), "read", Some(arguments), None, &request)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_message(), "Node 0 does not exist");
    }

    #[tokio::test]
    async fn test_invoke_undeclared_operation() {
        let (invoker, plugin) = invoker();
        let request = DispatchRequest::builder(RouteTarget::new("node", "publish")).build();
        let err = invoker
            .invoke(plugin.as_ref(), "publish", None, None, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::OperationNotFound { .. }));
    }
}
