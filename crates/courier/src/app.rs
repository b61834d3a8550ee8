//! Application assembly.
//!
//! [`App`] wires the pieces together: configuration, telemetry, the plugin
//! registry, routes, the dispatcher and the server. With a configuration
//! file and [`AppBuilder::watch_config`], edits to `[resources]` take effect
//! without a restart.

use std::path::PathBuf;
use std::sync::Arc;

use courier_config::{ConfigLoader, CourierConfig};
use courier_core::{ResourcePlugin, RouteTarget};
use courier_dispatch::{Dispatcher, PluginRegistry};
use courier_format::FormatRegistry;
use courier_router::Router;
use courier_server::{Server, ShutdownSignal};
use http::Method;

use crate::error::{AppError, AppResult};
use crate::reload::PolicyReloader;

/// Prefix for environment overrides, as in `COURIER__SERVER__HTTP_ADDR`.
pub const ENV_PREFIX: &str = "COURIER";

/// A configured Courier application.
///
/// # Example
///
/// ```rust,no_run
/// use courier::prelude::*;
/// use courier::core::fixtures;
///
/// # async fn example() -> Result<(), AppError> {
/// App::builder()
///     .config_file("courier.toml")?
///     .watch_config(true)
///     .telemetry(true)
///     .plugin(fixtures::node_resource())?
///     .resource("/node", Method::POST, "node", "create", Some("hal_json"))?
///     .resource("/node/{id}", Method::GET, "node", "read", None)?
///     .build()?
///     .run()
///     .await
/// # }
/// ```
#[derive(Debug)]
pub struct App {
    config: CourierConfig,
    dispatcher: Arc<Dispatcher>,
    server: Server,
    reloader: Option<PolicyReloader>,
}

impl App {
    /// Creates an application builder.
    #[must_use]
    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    /// Returns the effective configuration.
    #[must_use]
    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Returns the server.
    #[must_use]
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Returns the configuration reloader, when watching is enabled.
    #[must_use]
    pub fn reloader(&self) -> Option<&PolicyReloader> {
        self.reloader.as_ref()
    }

    /// Consumes the application, returning its server.
    #[must_use]
    pub fn into_server(self) -> Server {
        self.server
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> AppResult<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Serves until `shutdown` fires.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> AppResult<()> {
        let watcher = self.reloader.map(PolicyReloader::spawn);
        let result = self.server.run_with_shutdown(shutdown).await;
        if let Some(watcher) = watcher {
            watcher.abort();
        }
        Ok(result?)
    }
}

/// Builder for [`App`].
#[derive(Debug, Default)]
pub struct AppBuilder {
    config: Option<CourierConfig>,
    config_path: Option<PathBuf>,
    watch_config: bool,
    telemetry: bool,
    registry: PluginRegistry,
    router: Router,
    formats: Option<FormatRegistry>,
}

impl AppBuilder {
    /// Uses an in-memory configuration.
    #[must_use]
    pub fn config(mut self, config: CourierConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Loads configuration from a file, with `COURIER__*` overrides and
    /// `.env` support.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let config = ConfigLoader::new()
            .with_dotenv()?
            .with_file(&path)?
            .with_env_prefix(ENV_PREFIX)
            .load()?;
        self.config = Some(config);
        self.config_path = Some(path);
        Ok(self)
    }

    /// Reloads `[resources]` when the configuration file changes.
    ///
    /// Only has an effect together with [`config_file`](Self::config_file).
    #[must_use]
    pub fn watch_config(mut self, watch: bool) -> Self {
        self.watch_config = watch;
        self
    }

    /// Installs logging and metrics from `[telemetry]` on build.
    #[must_use]
    pub fn telemetry(mut self, enabled: bool) -> Self {
        self.telemetry = enabled;
        self
    }

    /// Registers a shared plugin.
    pub fn plugin(mut self, plugin: impl ResourcePlugin + 'static) -> AppResult<Self> {
        self.registry.register(plugin)?;
        Ok(self)
    }

    /// Registers a plugin built fresh for every request.
    pub fn plugin_factory<P, F>(mut self, factory: F) -> AppResult<Self>
    where
        P: ResourcePlugin + 'static,
        F: Fn() -> P + Send + Sync + 'static,
    {
        self.registry.register_factory(factory)?;
        Ok(self)
    }

    /// Routes `method` on `pattern` to a plugin operation, optionally fixing
    /// the response format.
    pub fn resource(
        mut self,
        pattern: &str,
        method: Method,
        plugin_id: &str,
        operation: &str,
        format: Option<&str>,
    ) -> AppResult<Self> {
        self.router
            .resource(pattern, method, plugin_id, operation, format)?;
        Ok(self)
    }

    /// Routes `method` on `pattern` to a prepared target.
    pub fn route(mut self, method: Method, pattern: &str, target: RouteTarget) -> AppResult<Self> {
        self.router.route(method, pattern, target)?;
        Ok(self)
    }

    /// Replaces the default codecs.
    #[must_use]
    pub fn formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = Some(formats);
        self
    }

    /// Validates the configuration and assembles the application.
    pub fn build(self) -> AppResult<App> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        if self.telemetry {
            courier_telemetry::init_telemetry(&config.telemetry)?;
        }

        let mut dispatcher = Dispatcher::builder()
            .registry(self.registry)
            .config(&config.dispatch)
            .enablement(config.resources.clone());
        if let Some(formats) = self.formats {
            dispatcher = dispatcher.formats(formats);
        }
        let dispatcher = Arc::new(dispatcher.build());

        let reloader = match (&self.config_path, self.watch_config) {
            (Some(path), true) => Some(
                PolicyReloader::new(path, Arc::clone(dispatcher.policy()))
                    .with_env_prefix(ENV_PREFIX),
            ),
            _ => None,
        };

        let plugin_count = dispatcher.registry().len();
        let server = Server::builder()
            .config(&config.server)
            .service_name(config.telemetry.service_name.clone())
            .router(self.router)
            .shared_dispatcher(Arc::clone(&dispatcher))
            .readiness_check("plugins_registered", move || plugin_count > 0)
            .build();

        tracing::info!(
            plugins = ?dispatcher.registry().plugin_ids(),
            routes = server.router().len(),
            default_format = %dispatcher.default_format(),
            "Courier application assembled"
        );

        Ok(App {
            config,
            dispatcher,
            server,
            reloader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::{DispatchConfig, EnablementTable};
    use courier_core::fixtures;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_with_defaults() {
        let app = App::builder().build().unwrap();
        assert_eq!(app.config().dispatch.default_format, "hal_json");
        assert!(app.dispatcher().registry().is_empty());
        assert!(app.reloader().is_none());
        assert!(!app.server().readiness().is_ready());
    }

    #[test]
    fn test_build_applies_config() {
        let config = CourierConfig::builder()
            .dispatch(DispatchConfig {
                default_format: "json".to_string(),
                max_body_bytes: 128,
            })
            .resources(EnablementTable::new().enable("node", "POST", "json"))
            .build();
        let app = App::builder()
            .config(config)
            .plugin(fixtures::node_resource())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(app.dispatcher().default_format(), "json");
        assert_eq!(app.dispatcher().max_body_bytes(), 128);
        assert!(!app.dispatcher().policy().allows("node", "POST", Some("hal_json")));
        assert!(app.server().readiness().is_ready());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = CourierConfig::default();
        config.server.http_addr = "nowhere".to_string();
        assert!(matches!(
            App::builder().config(config).build(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_duplicate_plugin_rejected() {
        let result = App::builder()
            .plugin(fixtures::node_resource())
            .unwrap()
            .plugin(fixtures::node_resource());
        assert!(matches!(result, Err(AppError::Registry(_))));
    }

    #[test]
    fn test_conflicting_route_rejected() {
        let result = App::builder()
            .resource("/node/{id}", Method::GET, "node", "read", None)
            .unwrap()
            .resource("/node/{nid}", Method::GET, "node", "read", None);
        assert!(matches!(result, Err(AppError::Route(_))));
    }

    #[test]
    fn test_config_file_enables_reloader() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("courier.toml");
        fs::write(&path, "[dispatch]\ndefault_format = \"json\"\n").unwrap();

        let app = App::builder()
            .config_file(&path)
            .unwrap()
            .watch_config(true)
            .build()
            .unwrap();
        assert_eq!(app.config().dispatch.default_format, "json");
        assert_eq!(app.reloader().unwrap().path(), path.as_path());
    }

    #[test]
    fn test_missing_config_file() {
        let result = App::builder().config_file("/nonexistent/courier.toml");
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
