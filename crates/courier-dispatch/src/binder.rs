//! Parameter binder.
//!
//! Builds the [`ArgumentSet`] for one call from the operation's declared
//! manifest. A parameter that cannot be found binds to an absent value; the
//! binder never fails and never changes the body.

use courier_core::{
    ArgumentSet, ParameterLocation, ParameterManifest, RouteAttributes, StructuredBody,
};

/// Binds declared parameters from route attributes and the body.
///
/// Returns `None` when the operation declares no parameter list, and an
/// (possibly empty) argument set otherwise.
///
/// # Example
///
/// ```
/// use courier_core::{OperationMetadata, RouteAttributes, StructuredBody};
/// use courier_dispatch::bind_arguments;
/// use serde_json::json;
///
/// let update = OperationMetadata::builder("update").uri("id").body("title").build().unwrap();
/// let attributes: RouteAttributes = [("id", "7")].into_iter().collect();
/// let body = StructuredBody::new(json!({"title": "Hello", "id": "ignored"}));
///
/// let arguments = bind_arguments(update.parameters(), &attributes, Some(&body)).unwrap();
/// assert_eq!(arguments.get_str("id"), Some("7"));
/// assert_eq!(arguments.get("title"), Some(&json!("Hello")));
/// ```
#[must_use]
pub fn bind_arguments(
    manifest: Option<&ParameterManifest>,
    attributes: &RouteAttributes,
    body: Option<&StructuredBody>,
) -> Option<ArgumentSet> {
    let manifest = manifest?;
    let mut arguments = ArgumentSet::new();

    for (name, location) in manifest {
        let value = match location {
            ParameterLocation::Uri => attributes
                .get(name)
                .map(|value| serde_json::Value::String(value.to_string())),
            ParameterLocation::Body => body.and_then(|body| body.field(name)).cloned(),
        };
        arguments.bind(name.clone(), value);
    }

    Some(arguments)
}
