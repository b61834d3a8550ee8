//! # Courier Core
//!
//! Core types and traits for the Courier REST dispatcher.
//!
//! - [`ResourcePlugin`] - A REST resource exposing named operations
//! - [`OperationMetadata`] - Static parameter manifest of one operation
//! - [`DispatchRequest`] - A request together with its resolved [`RouteTarget`]
//! - [`StructuredBody`] - A parsed request body with total field access
//! - [`ArgumentSet`] - Arguments bound for one operation call
//! - [`OperationResult`] - What an operation returns on success
//! - [`DispatchError`] - Protocol-level failures and their HTTP mapping
//! - [`RequestContext`] / [`RequestId`] - Per-request identity and timing

#![doc(html_root_url = "https://docs.rs/courier-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod arguments;
mod context;
mod error;
pub mod fixtures;
mod manifest;
mod plugin;
mod request;
mod result;
mod route;
mod value;

pub use arguments::ArgumentSet;
pub use context::{RequestContext, RequestId};
pub use error::{DispatchError, DispatchResult, ErrorCategory, ErrorPayload};
pub use manifest::{
    validate_operations, ManifestError, OperationMetadata, OperationMetadataBuilder,
    ParameterLocation, ParameterManifest,
};
pub use plugin::ResourcePlugin;
pub use request::{DispatchRequest, DispatchRequestBuilder};
pub use result::OperationResult;
pub use route::{RouteAttributes, RouteTarget};
pub use value::{BodyKind, StructuredBody};
