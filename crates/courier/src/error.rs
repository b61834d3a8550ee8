//! Application errors.

use courier_config::ConfigError;
use courier_dispatch::RegistryError;
use courier_router::RouteError;
use courier_server::ServerError;
use courier_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while assembling or running an [`App`](crate::App).
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// A plugin could not be registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A route could not be declared.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The server failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Result type for application assembly.
pub type AppResult<T> = Result<T, AppError>;
