//! Bound operation arguments.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Arguments bound for one operation call, in manifest order.
///
/// Every declared parameter has an entry. A parameter whose source had no
/// value is bound to `None`, so "declared but absent" stays distinguishable
/// from "not declared".
///
/// # Example
///
/// ```
/// use courier_core::ArgumentSet;
/// use serde_json::json;
///
/// let mut arguments = ArgumentSet::new();
/// arguments.bind("title", Some(json!("Hello")));
/// arguments.bind("status", None);
///
/// assert_eq!(arguments.get_str("title"), Some("Hello"));
/// assert!(arguments.is_declared("status"));
/// assert_eq!(arguments.get("status"), None);
/// assert!(!arguments.is_declared("body"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ArgumentSet {
    values: IndexMap<String, Option<Value>>,
}

impl ArgumentSet {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a parameter to a value or to the absent marker.
    pub fn bind(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.values.insert(name.into(), value);
    }

    /// Returns the bound value, or `None` if it is absent or undeclared.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(Option::as_ref)
    }

    /// Returns the bound value as a string slice.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns true if the parameter has an entry, bound or absent.
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over entries in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Converts the set into a JSON object, with absent values as `null`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone().unwrap_or(Value::Null)))
                .collect(),
        )
    }
}

impl FromIterator<(String, Option<Value>)> for ArgumentSet {
    fn from_iter<I: IntoIterator<Item = (String, Option<Value>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
