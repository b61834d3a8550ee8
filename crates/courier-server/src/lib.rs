//! # Courier Server
//!
//! HTTP host for the Courier dispatcher, built on Hyper and Tokio.
//!
//! - [`Server`] / [`ServerBuilder`] - accept loop, route lookup, body
//!   collection and dispatch
//! - [`HealthCheck`] / [`ReadinessCheck`] - `/health` and `/ready` probes
//! - [`ShutdownSignal`] / [`ConnectionTracker`] - graceful shutdown
//!
//! Prometheus metrics are served at `GET /metrics` once
//! `courier_telemetry::init_metrics` has installed a recorder.

#![doc(html_root_url = "https://docs.rs/courier-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod health;
mod server;
mod shutdown;

pub use error::ServerError;
pub use health::{HealthCheck, HealthStatus, ReadinessCheck, ReadinessStatus};
pub use server::{Server, ServerBuilder, REQUEST_ID_HEADER};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
