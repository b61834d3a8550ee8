//! # Courier Dispatch
//!
//! The request dispatch pipeline. A routed [`DispatchRequest`] goes through:
//!
//! - [`FormatPolicy`] - is the request body format enabled for this plugin
//!   and method?
//! - [`BodyDeserializer`] - raw payload to [`StructuredBody`]
//! - [`bind_arguments`] - declared parameters from route attributes and body
//! - [`OperationInvoker`] - plugin lookup in the [`PluginRegistry`] and the
//!   operation call
//! - [`ResponseSerializer`] - operation result to wire format
//! - [`ErrorTranslator`] - any failure to a `{"error": ...}` response
//!
//! [`Dispatcher`] composes them and always answers with a response.
//!
//! [`DispatchRequest`]: courier_core::DispatchRequest
//! [`StructuredBody`]: courier_core::StructuredBody

#![doc(html_root_url = "https://docs.rs/courier-dispatch/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binder;
mod deserializer;
mod dispatcher;
mod error;
mod invoker;
mod policy;
mod registry;
mod serializer;
mod translator;

pub use binder::bind_arguments;
pub use deserializer::BodyDeserializer;
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::RegistryError;
pub use invoker::OperationInvoker;
pub use policy::{is_format_allowed, FormatPolicy};
pub use registry::{PluginFactory, PluginRegistry};
pub use serializer::ResponseSerializer;
pub use translator::ErrorTranslator;
