//! # Courier
//!
//! **Plugin-based REST request dispatcher with per-resource format policies**
//!
//! Courier routes REST requests to resource plugins. Each plugin exposes
//! named operations; each operation declares where its parameters come
//! from. For every request Courier:
//!
//! ```text
//! route -> resolve plugin -> format policy -> deserialize -> bind -> invoke -> serialize
//!                                                                                 |
//!                         any failure -> {"error": message} in the response format
//! ```
//!
//! - Request formats can be restricted per plugin and HTTP method through
//!   the `[resources]` table, which reloads without a restart.
//! - Responses use the route's fixed format or `hal_json`.
//! - Every failure becomes an HTTP error response with the right status.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier::prelude::*;
//! use courier::core::fixtures;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     App::builder()
//!         .config(CourierConfig::development())
//!         .telemetry(true)
//!         .plugin(fixtures::node_resource())?
//!         .resource("/node", Method::POST, "node", "create", Some("hal_json"))?
//!         .resource("/node/{id}", Method::GET, "node", "read", None)?
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/courier/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod error;
mod reload;

pub use app::{App, AppBuilder, ENV_PREFIX};
pub use error::{AppError, AppResult};
pub use reload::PolicyReloader;

pub use courier_config as config;
pub use courier_core as core;
pub use courier_dispatch as dispatch;
pub use courier_format as format;
pub use courier_router as router;
pub use courier_server as server;
pub use courier_telemetry as telemetry;

/// Common imports for applications and plugin authors.
///
/// ```rust
/// use courier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{App, AppBuilder, AppError, AppResult};

    pub use courier_config::{CourierConfig, EnablementTable};
    pub use courier_core::{
        ArgumentSet, DispatchError, DispatchRequest, DispatchResult, OperationMetadata,
        OperationResult, ParameterLocation, RequestContext, ResourcePlugin, RouteTarget,
        StructuredBody,
    };
    pub use courier_dispatch::{Dispatcher, PluginRegistry};
    pub use courier_server::{Server, ShutdownSignal};

    pub use http::{Method, StatusCode};
}
