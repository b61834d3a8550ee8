//! Deserialized request bodies.
//!
//! A [`StructuredBody`] wraps the format-independent value tree a codec
//! produced. Field and index access are total: every lookup answers with a
//! value or `None`, regardless of whether the body is an object, an array, a
//! scalar or null.
//!
//! Field access first coerces the body to a keyed form:
//!
//! | Body | Keys |
//! |---|---|
//! | object | its member names |
//! | array | canonical decimal indices (`"0"`, `"1"`, ...) |
//! | scalar | the single key `"0"` |
//! | null | none |
//!
//! Members whose value is `null` read as absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The shape of a structured body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// A keyed object.
    Object,
    /// An ordered array.
    Array,
    /// A string, number or boolean.
    Scalar,
    /// An explicit null.
    Null,
}

/// A parsed request body.
///
/// # Example
///
/// ```
/// use courier_core::StructuredBody;
/// use serde_json::json;
///
/// let body = StructuredBody::new(json!({"title": "Hello", "tags": ["a", "b"]}));
/// assert_eq!(body.field("title"), Some(&json!("Hello")));
/// assert_eq!(body.field("missing"), None);
///
/// let list = StructuredBody::new(json!(["x", "y"]));
/// assert_eq!(list.field("1"), Some(&json!("y")));
/// assert_eq!(list.index(0), Some(&json!("x")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredBody(Value);

impl StructuredBody {
    /// Wraps a parsed value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the shape of the body.
    #[must_use]
    pub const fn kind(&self) -> BodyKind {
        match &self.0 {
            Value::Object(_) => BodyKind::Object,
            Value::Array(_) => BodyKind::Array,
            Value::Null => BodyKind::Null,
            Value::Bool(_) | Value::Number(_) | Value::String(_) => BodyKind::Scalar,
        }
    }

    /// Reads a named field after coercing the body to a keyed form.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        let found = match &self.0 {
            Value::Object(map) => map.get(name),
            Value::Array(items) => canonical_index(name).and_then(|i| items.get(i)),
            Value::Null => None,
            scalar => (name == "0").then_some(scalar),
        };
        found.filter(|value| !value.is_null())
    }

    /// Reads a positional element.
    ///
    /// Objects answer for the member whose name is the decimal index.
    #[must_use]
    pub fn index(&self, index: usize) -> Option<&Value> {
        let found = match &self.0 {
            Value::Array(items) => items.get(index),
            Value::Object(map) => map.get(&index.to_string()),
            Value::Null => None,
            scalar => (index == 0).then_some(scalar),
        };
        found.filter(|value| !value.is_null())
    }

    /// Returns the number of keys the body exposes to field access.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.0 {
            Value::Object(map) => map.len(),
            Value::Array(items) => items.len(),
            Value::Null => 0,
            _ => 1,
        }
    }

    /// Returns true if field access can never succeed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the body and returns the underlying value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for StructuredBody {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// "01" and "+1" are member names, not indices.
fn canonical_index(name: &str) -> Option<usize> {
    let index = name.parse::<usize>().ok()?;
    (index.to_string() == name).then_some(index)
}
