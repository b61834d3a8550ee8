//! The dispatcher.
//!
//! Runs one request through the pipeline:
//!
//! ```text
//! resolve plugin -> format policy -> deserialize -> bind -> invoke -> serialize
//!                        |                |          |        |          |
//!                        +----------------+----------+--------+----------+--> translate error
//! ```
//!
//! The policy and deserializer only run when the request has a body. Every
//! failure is translated exactly once, here, so [`Dispatcher::dispatch`]
//! always produces a response.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use courier_config::{DispatchConfig, EnablementTable};
use courier_core::{
    DispatchError, DispatchRequest, DispatchResult, ResourcePlugin, RouteTarget, StructuredBody,
};
use courier_format::{FormatRegistry, DEFAULT_FORMAT};
use courier_telemetry::{
    log_dispatch_complete, log_dispatch_error, log_dispatch_start, record_dispatch,
    record_dispatch_error, InFlightGuard,
};
use http::Response;
use tracing::Instrument;

use crate::binder::bind_arguments;
use crate::deserializer::BodyDeserializer;
use crate::error::RegistryError;
use crate::invoker::OperationInvoker;
use crate::policy::FormatPolicy;
use crate::registry::PluginRegistry;
use crate::serializer::ResponseSerializer;
use crate::translator::ErrorTranslator;

const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Dispatches routed requests to resource plugins.
///
/// # Example
///
/// ```
/// use courier_config::EnablementTable;
/// use courier_core::{fixtures, DispatchRequest, RouteTarget};
/// use courier_dispatch::Dispatcher;
///
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let dispatcher = Dispatcher::builder()
///     .plugin(fixtures::node_resource())
///     .unwrap()
///     .enablement(EnablementTable::new().enable("node", "POST", "json"))
///     .build();
///
/// let request = DispatchRequest::builder(RouteTarget::new("node", "create"))
///     .method(http::Method::POST)
///     .content_type("application/hal+json")
///     .body(r#"{"title":"Hello"}"#)
///     .build();
///
/// let response = dispatcher.dispatch(request).await;
/// assert_eq!(response.status(), http::StatusCode::UNSUPPORTED_MEDIA_TYPE);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    invoker: OperationInvoker,
    policy: Arc<FormatPolicy>,
    deserializer: BodyDeserializer,
    serializer: ResponseSerializer,
    translator: ErrorTranslator,
    formats: Arc<FormatRegistry>,
    default_format: String,
}

impl Dispatcher {
    /// Starts building a dispatcher.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Returns the live format policy.
    #[must_use]
    pub fn policy(&self) -> &Arc<FormatPolicy> {
        &self.policy
    }

    /// Returns the plugin registry.
    #[must_use]
    pub fn registry(&self) -> &PluginRegistry {
        self.invoker.registry()
    }

    /// Returns the format registry.
    #[must_use]
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Returns the response format used when a route fixes none.
    #[must_use]
    pub fn default_format(&self) -> &str {
        &self.default_format
    }

    /// Returns the body size limit.
    #[must_use]
    pub const fn max_body_bytes(&self) -> usize {
        self.deserializer.max_body_bytes()
    }

    /// Translates an error raised outside the pipeline for a routed request,
    /// such as an oversized body found while reading it.
    #[must_use]
    pub fn translate(&self, error: &DispatchError, route: &RouteTarget) -> Response<Bytes> {
        self.translator
            .translate(error, route.response_format(&self.default_format))
    }

    /// Dispatches a request. Never fails: errors become error responses.
    pub async fn dispatch(&self, request: DispatchRequest) -> Response<Bytes> {
        let span = tracing::info_span!(
            "dispatch",
            request_id = %request.context().request_id(),
            plugin = %request.route().plugin_id(),
            operation = %request.route().operation(),
            method = %request.method(),
        );
        self.dispatch_in_span(request).instrument(span).await
    }

    async fn dispatch_in_span(&self, request: DispatchRequest) -> Response<Bytes> {
        let _in_flight = InFlightGuard::new();
        let started = Instant::now();
        let route = request.route();
        let request_id = request.context().request_id();
        let response_format = route.response_format(&self.default_format);

        log_dispatch_start!(request_id, request.method(), route.plugin_id(), route.operation());

        let response = match self.run(&request, response_format).await {
            Ok(response) => response,
            Err(error) => {
                let status = error.status_code().as_u16();
                if matches!(error, DispatchError::Internal { .. }) {
                    tracing::error!(request_id = %request_id, error = ?error, "Internal dispatch failure");
                }
                log_dispatch_error!(request_id, error, error.category(), status);
                record_dispatch_error(route.plugin_id(), error.category().as_str());
                self.translator.translate(&error, response_format)
            }
        };

        let elapsed = started.elapsed();
        let status = response.status().as_u16();
        record_dispatch(route.plugin_id(), route.operation(), status, elapsed);
        log_dispatch_complete!(
            request_id,
            status,
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        );
        response
    }

    async fn run(
        &self,
        request: &DispatchRequest,
        response_format: &str,
    ) -> DispatchResult<Response<Bytes>> {
        let route = request.route();
        let plugin = self.invoker.resolve_plugin(route.plugin_id())?;
        let body = self.read_body(plugin.as_ref(), request)?;

        let metadata = OperationInvoker::operation_metadata(plugin.as_ref(), route.operation())?;
        let arguments = bind_arguments(metadata.parameters(), request.attributes(), body.as_ref());

        let result = self
            .invoker
            .invoke(plugin.as_ref(), route.operation(), arguments, body.as_ref(), request)
            .await?;
        self.serializer.serialize(result, response_format)
    }

    fn read_body(
        &self,
        plugin: &dyn ResourcePlugin,
        request: &DispatchRequest,
    ) -> DispatchResult<Option<StructuredBody>> {
        let raw = request.body();
        if raw.is_empty() {
            return Ok(None);
        }
        self.deserializer.check_size(raw.len())?;

        let format = self.deserializer.request_format(request);
        if !self
            .policy
            .allows(plugin.id(), request.method().as_str(), format)
        {
            tracing::debug!(
                format = format.unwrap_or("unknown"),
                content_type = request.content_type().unwrap_or_default(),
                "Request format is not enabled"
            );
            return Err(DispatchError::unsupported_format(format));
        }

        self.deserializer.deserialize(raw, format)
    }
}

/// Builder for [`Dispatcher`].
#[derive(Debug)]
pub struct DispatcherBuilder {
    registry: PluginRegistry,
    formats: Option<FormatRegistry>,
    policy: Option<Arc<FormatPolicy>>,
    enablement: EnablementTable,
    default_format: String,
    max_body_bytes: usize,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            registry: PluginRegistry::new(),
            formats: None,
            policy: None,
            enablement: EnablementTable::new(),
            default_format: DEFAULT_FORMAT.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl DispatcherBuilder {
    /// Uses a populated plugin registry.
    #[must_use]
    pub fn registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registers a shared plugin.
    pub fn plugin(mut self, plugin: impl ResourcePlugin + 'static) -> Result<Self, RegistryError> {
        self.registry.register(plugin)?;
        Ok(self)
    }

    /// Uses a format registry. Defaults to `json`, `hal_json` and `form`.
    #[must_use]
    pub fn formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Some(formats);
        self
    }

    /// Sets the initial enablement table.
    #[must_use]
    pub fn enablement(mut self, table: EnablementTable) -> Self {
        self.enablement = table;
        self
    }

    /// Shares an existing policy, ignoring [`enablement`](Self::enablement).
    #[must_use]
    pub fn policy(mut self, policy: Arc<FormatPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Sets the response format for routes that fix none.
    #[must_use]
    pub fn default_format(mut self, format: impl Into<String>) -> Self {
        self.default_format = format.into();
        self
    }

    /// Sets the body size limit.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Applies a `[dispatch]` section.
    #[must_use]
    pub fn config(self, config: &DispatchConfig) -> Self {
        self.default_format(config.default_format.clone())
            .max_body_bytes(config.max_body_bytes)
    }

    /// Builds the dispatcher.
    #[must_use]
    pub fn build(self) -> Dispatcher {
        let formats = Arc::new(self.formats.unwrap_or_else(FormatRegistry::with_defaults));
        if !formats.contains(&self.default_format) {
            tracing::warn!(
                format = %self.default_format,
                "Default response format has no codec; responses will fail to serialize"
            );
        }

        let policy = self
            .policy
            .unwrap_or_else(|| Arc::new(FormatPolicy::new(self.enablement)));

        Dispatcher {
            invoker: OperationInvoker::new(Arc::new(self.registry)),
            policy,
            deserializer: BodyDeserializer::new(Arc::clone(&formats), self.max_body_bytes),
            serializer: ResponseSerializer::new(Arc::clone(&formats)),
            translator: ErrorTranslator::new(Arc::clone(&formats)),
            formats,
            default_format: self.default_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::fixtures;
    use http::header::CONTENT_TYPE;
    use http::{Method, StatusCode};

    fn node_dispatcher() -> DispatcherBuilder {
        Dispatcher::builder().plugin(fixtures::node_resource()).unwrap()
    }

    fn read(id: &str) -> DispatchRequest {
        DispatchRequest::builder(RouteTarget::new("node", "read"))
            .method(Method::GET)
            .attribute("id", id)
            .build()
    }

    #[test]
    fn test_builder_defaults() {
        let dispatcher = Dispatcher::builder().build();
        assert_eq!(dispatcher.default_format(), DEFAULT_FORMAT);
        assert_eq!(dispatcher.max_body_bytes(), DEFAULT_MAX_BODY_BYTES);
        assert!(dispatcher.registry().is_empty());
        assert!(dispatcher.formats().contains("form"));
    }

    #[test]
    fn test_builder_applies_config() {
        let dispatcher = Dispatcher::builder()
            .config(&DispatchConfig {
                default_format: "json".to_string(),
                max_body_bytes: 64,
            })
            .build();
        assert_eq!(dispatcher.default_format(), "json");
        assert_eq!(dispatcher.max_body_bytes(), 64);
    }

    #[test]
    fn test_shared_policy_wins_over_enablement() {
        let policy = Arc::new(FormatPolicy::new(EnablementTable::new()));
        let dispatcher = Dispatcher::builder()
            .enablement(EnablementTable::new().enable("node", "POST", "json"))
            .policy(Arc::clone(&policy))
            .build();

        assert!(Arc::ptr_eq(dispatcher.policy(), &policy));
        assert!(dispatcher.policy().allows("node", "POST", Some("hal_json")));
    }

    #[test]
    fn test_duplicate_plugin() {
        let result = node_dispatcher().plugin(fixtures::node_resource());
        assert!(result.is_err());
    }

    #[test]
    fn test_translate_uses_route_format() {
        let dispatcher = Dispatcher::builder().build();
        let error = DispatchError::unsupported_format(Some("form"));

        let route = RouteTarget::new("node", "create").with_format("json");
        let fixed = dispatcher.translate(&error, &route);
        assert_eq!(fixed.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(fixed.headers()[CONTENT_TYPE], "application/json");

        let default = dispatcher.translate(&error, &RouteTarget::new("node", "create"));
        assert_eq!(default.headers()[CONTENT_TYPE], "application/hal+json");
    }

    #[tokio::test]
    async fn test_dispatch_read() {
        let dispatcher = node_dispatcher().build();
        let response = dispatcher.dispatch(read("7")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/hal+json");
    }

    #[tokio::test]
    async fn test_unknown_default_format_is_500_in_json() {
        let dispatcher = node_dispatcher().default_format("xml").build();
        let response = dispatcher.dispatch(read("7")).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body["error"].is_string());
    }
}
