//! Plugin registry.
//!
//! Resource plugins are registered once at startup, either as a shared
//! instance or as a factory that produces a fresh instance per request.
//! Manifests are validated on registration, so every plugin the dispatcher
//! can reach has a well-formed operation list.

use std::collections::HashMap;
use std::sync::Arc;

use courier_core::{validate_operations, OperationMetadata, ResourcePlugin};

use crate::error::RegistryError;

/// Produces a plugin instance.
pub type PluginFactory = Arc<dyn Fn() -> Arc<dyn ResourcePlugin> + Send + Sync>;

#[derive(Clone)]
enum PluginEntry {
    Shared(Arc<dyn ResourcePlugin>),
    Factory {
        factory: PluginFactory,
        operations: Vec<OperationMetadata>,
    },
}

/// Resource plugins keyed by id.
///
/// # Example
///
/// ```
/// use courier_core::fixtures;
/// use courier_dispatch::PluginRegistry;
///
/// let mut registry = PluginRegistry::new();
/// registry.register(fixtures::node_resource()).unwrap();
///
/// assert!(registry.contains("node"));
/// assert!(registry.get_instance("node").is_some());
/// assert!(registry.register(fixtures::node_resource()).is_err());
/// ```
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, PluginEntry>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin shared by all requests.
    pub fn register(&mut self, plugin: impl ResourcePlugin + 'static) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(plugin))
    }

    /// Registers an already shared plugin.
    pub fn register_shared(&mut self, plugin: Arc<dyn ResourcePlugin>) -> Result<(), RegistryError> {
        let id = self.check(plugin.as_ref())?;
        tracing::debug!(plugin = %id, operations = ?plugin.list_operations(), "Registered resource plugin");
        self.plugins.insert(id, PluginEntry::Shared(plugin));
        Ok(())
    }

    /// Registers a factory called once per request.
    ///
    /// The factory is called once here to learn the plugin id and validate
    /// its manifest. Every later instance must carry the same id and
    /// operations; the invoker refuses an instance with another id.
    pub fn register_factory<P, F>(&mut self, factory: F) -> Result<(), RegistryError>
    where
        P: ResourcePlugin + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        let sample = factory();
        let id = self.check(&sample)?;
        let operations = sample.operations().to_vec();
        let factory: PluginFactory =
            Arc::new(move || -> Arc<dyn ResourcePlugin> { Arc::new(factory()) });

        tracing::debug!(plugin = %id, operations = operations.len(), "Registered resource plugin factory");
        self.plugins.insert(id, PluginEntry::Factory { factory, operations });
        Ok(())
    }

    fn check(&self, plugin: &dyn ResourcePlugin) -> Result<String, RegistryError> {
        let id = plugin.id();
        if id.is_empty() {
            return Err(RegistryError::EmptyId);
        }
        if self.plugins.contains_key(id) {
            return Err(RegistryError::duplicate(id));
        }
        validate_operations(plugin.operations())
            .map_err(|e| RegistryError::invalid_manifest(id, e))?;
        Ok(id.to_string())
    }

    /// Returns an instance of the plugin registered under `plugin_id`.
    ///
    /// Shared plugins return the same instance each time; factories build a
    /// new one.
    #[must_use]
    pub fn get_instance(&self, plugin_id: &str) -> Option<Arc<dyn ResourcePlugin>> {
        match self.plugins.get(plugin_id)? {
            PluginEntry::Shared(plugin) => Some(Arc::clone(plugin)),
            PluginEntry::Factory { factory, .. } => Some(factory()),
        }
    }

    /// Returns the declared operations of a plugin without instantiating it.
    #[must_use]
    pub fn operations(&self, plugin_id: &str) -> Option<&[OperationMetadata]> {
        match self.plugins.get(plugin_id)? {
            PluginEntry::Shared(plugin) => Some(plugin.operations()),
            PluginEntry::Factory { operations, .. } => Some(operations),
        }
    }

    /// Returns true if a plugin is registered under `plugin_id`.
    #[must_use]
    pub fn contains(&self, plugin_id: &str) -> bool {
        self.plugins.contains_key(plugin_id)
    }

    /// Returns the registered ids, sorted.
    #[must_use]
    pub fn plugin_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if no plugin is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugin_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::fixtures::{self, RecordingResource};
    use courier_core::{ManifestError, OperationMetadata};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_register_and_lookup() {
        let mut registry = PluginRegistry::new();
        assert!(registry.is_empty());
        registry.register(fixtures::node_resource()).unwrap();
        registry
            .register(RecordingResource::new("user"))
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.plugin_ids(), vec!["node", "user"]);
        assert!(registry.get_instance("comment").is_none());
        assert_eq!(registry.operations("node").unwrap().len(), 5);
    }

    #[test]
    fn test_shared_instance_is_reused() {
        let mut registry = PluginRegistry::new();
        registry.register(fixtures::node_resource()).unwrap();
        let a = registry.get_instance("node").unwrap();
        let b = registry.get_instance("node").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_factory_builds_per_call() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);

        let mut registry = PluginRegistry::new();
        registry
            .register_factory(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                fixtures::node_resource()
            })
            .unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(registry.operations("node").unwrap().len(), 5);

        let a = registry.get_instance("node").unwrap();
        let b = registry.get_instance("node").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = PluginRegistry::new();
        registry.register(fixtures::node_resource()).unwrap();
        assert_eq!(
            registry.register_factory(fixtures::node_resource),
            Err(RegistryError::duplicate("node"))
        );
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut registry = PluginRegistry::new();
        assert_eq!(
            registry.register(RecordingResource::new("")),
            Err(RegistryError::EmptyId)
        );
    }

    #[test]
    fn test_duplicate_operation_rejected() {
        let plugin = RecordingResource::new("node")
            .operation(OperationMetadata::new("read"))
            .operation(OperationMetadata::new("read"));
        let mut registry = PluginRegistry::new();
        assert!(matches!(
            registry.register(plugin),
            Err(RegistryError::InvalidManifest {
                source: ManifestError::DuplicateOperation { .. },
                ..
            })
        ));
        assert!(registry.is_empty());
    }
}
