//! Typed configuration for Courier.
//!
//! - [`CourierConfig`] - the root, with `[server]`, `[telemetry]`,
//!   `[dispatch]` and `[resources]` sections
//! - [`EnablementTable`] - request formats enabled per plugin and method
//! - [`ConfigLoader`] - defaults, file, `.env` and environment layers
//! - [`FileWatcher`] - change notifications for out-of-band reloads
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//!
//! [telemetry]
//! service_name = "content-api"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [telemetry.metrics]
//! enabled = true
//!
//! [dispatch]
//! default_format = "hal_json"
//! max_body_bytes = 1048576
//!
//! [resources.node.POST]
//! json = true
//! hal_json = true
//! ```
//!
//! # Environment Variable Overrides
//!
//! Scalar keys can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `COURIER__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `COURIER__DISPATCH__DEFAULT_FORMAT=json`
//! - `COURIER__TELEMETRY__LOGGING__LEVEL=debug`

#![doc(html_root_url = "https://docs.rs/courier-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod resources;
mod schema;
mod watcher;

pub use config::{CourierConfig, CourierConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resources::{EnablementTable, FormatSet};
pub use schema::{
    DispatchConfig, LogFormat, LoggingConfig, MetricsConfig, ServerConfig, TelemetryConfigSection,
};
pub use watcher::{ChangeCallback, FileChangeEvent, FileChangeKind, FileWatcher, FileWatcherBuilder};
