//! Test fixtures for Courier development and testing.
//!
//! [`RecordingResource`] is an in-memory resource plugin that records every
//! call it receives and answers through a configurable responder.
//! [`node_resource`] builds one shaped like a typical content resource.
//!
//! # Example
//!
//! ```
//! use courier_core::fixtures;
//! use courier_core::ResourcePlugin;
//!
//! let node = fixtures::node_resource();
//! assert_eq!(node.id(), "node");
//! assert!(node.operation_metadata("create").is_some());
//! assert_eq!(node.call_count(), 0);
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::arguments::ArgumentSet;
use crate::error::{DispatchError, DispatchResult};
use crate::manifest::OperationMetadata;
use crate::plugin::ResourcePlugin;
use crate::request::DispatchRequest;
use crate::result::OperationResult;
use crate::value::StructuredBody;

/// Computes the result of a recorded call.
pub type Responder =
    Arc<dyn Fn(&RecordedCall) -> DispatchResult<OperationResult> + Send + Sync>;

/// One call received by a [`RecordingResource`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// The invoked operation.
    pub operation: String,
    /// The bound arguments.
    pub arguments: Option<ArgumentSet>,
    /// The deserialized body.
    pub body: Option<Value>,
    /// The request method.
    pub method: Method,
}

/// An in-memory resource plugin that records its calls.
pub struct RecordingResource {
    id: String,
    operations: Vec<OperationMetadata>,
    responder: Responder,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingResource {
    /// Creates a plugin with no operations that echoes its arguments.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            operations: Vec::new(),
            responder: Arc::new(|call| Ok(OperationResult::ok(echo(call)))),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Declares an operation.
    #[must_use]
    pub fn operation(mut self, metadata: OperationMetadata) -> Self {
        self.operations.push(metadata);
        self
    }

    /// Replaces the responder.
    #[must_use]
    pub fn respond_with<F>(mut self, responder: F) -> Self
    where
        F: Fn(&RecordedCall) -> DispatchResult<OperationResult> + Send + Sync + 'static,
    {
        self.responder = Arc::new(responder);
        self
    }

    /// Returns a copy of all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the most recent call.
    #[must_use]
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }

    /// Returns the number of recorded calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl std::fmt::Debug for RecordingResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingResource")
            .field("id", &self.id)
            .field("operations", &self.operations)
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ResourcePlugin for RecordingResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn operations(&self) -> &[OperationMetadata] {
        &self.operations
    }

    async fn invoke(
        &self,
        operation: &str,
        arguments: Option<ArgumentSet>,
        body: Option<&StructuredBody>,
        request: &DispatchRequest,
    ) -> DispatchResult<OperationResult> {
        let call = RecordedCall {
            operation: operation.to_string(),
            arguments,
            body: body.map(|b| b.as_value().clone()),
            method: request.method().clone(),
        };
        let result = (self.responder)(&call);
        self.calls.lock().push(call);
        result
    }
}

/// Echo payload: `{"operation": ..., "arguments": ...}`.
#[must_use]
pub fn echo(call: &RecordedCall) -> Value {
    json!({
        "operation": call.operation,
        "arguments": call.arguments.as_ref().map(ArgumentSet::to_value),
    })
}

/// Operations of the `node` fixture resource.
///
/// - `index`: no parameter list
/// - `create`: `title` from the body
/// - `read`: `id` from the path
/// - `update`: `id` from the path, `title` from the body
/// - `delete`: `id` from the path
#[must_use]
pub fn node_operations() -> Vec<OperationMetadata> {
    [
        Ok(OperationMetadata::new("index")),
        OperationMetadata::builder("create").body("title").build(),
        OperationMetadata::builder("read").uri("id").build(),
        OperationMetadata::builder("update").uri("id").body("title").build(),
        OperationMetadata::builder("delete").uri("id").build(),
    ]
    .into_iter()
    .filter_map(Result::ok)
    .collect()
}

/// A `node` resource.
///
/// `create` answers 201 with the echo payload, `delete` answers 204, `read`
/// of id `"0"` is rejected with 404, everything else echoes with 200.
#[must_use]
pub fn node_resource() -> RecordingResource {
    node_operations()
        .into_iter()
        .fold(RecordingResource::new("node"), RecordingResource::operation)
        .respond_with(|call| match call.operation.as_str() {
            "create" => Ok(OperationResult::created(echo(call))),
            "delete" => Ok(OperationResult::no_content()),
            "read"
                if call
                    .arguments
                    .as_ref()
                    .and_then(|a| a.get_str("id"))
                    == Some("0") =>
            {
                Err(DispatchError::not_found("Node 0 does not exist"))
            }
            _ => Ok(OperationResult::ok(echo(call))),
        })
}
