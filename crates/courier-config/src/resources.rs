//! The format enablement table.
//!
//! `[resources]` maps a plugin id and an HTTP method to the request formats
//! enabled for it:
//!
//! ```toml
//! [resources.node.POST]
//! json = true
//! hal_json = true
//!
//! [resources.node.PATCH]
//! form = false
//!
//! [resources.node.GET]
//! ```
//!
//! A method with no format keys places no restriction at all. Once any key
//! is listed the entry is restricted: only formats flagged `true` pass, so
//! `node.PATCH` above accepts no request body format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

type RawTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, bool>>>;

/// The format flags configured for one `(plugin, method)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSet {
    flags: BTreeMap<String, bool>,
}

impl FormatSet {
    /// Returns true if `format` is flagged as enabled.
    #[must_use]
    pub fn contains(&self, format: &str) -> bool {
        self.flags.get(format).copied().unwrap_or(false)
    }

    /// Returns true if no format key is configured, which leaves the entry
    /// unrestricted.
    ///
    /// A set holding only disabled formats is not empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Returns the number of enabled formats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.values().filter(|enabled| **enabled).count()
    }

    /// Returns the enabled formats.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.flags
            .iter()
            .filter_map(|(format, enabled)| enabled.then_some(format.as_str()))
    }

    fn set(&mut self, format: String, enabled: bool) {
        let flag = self.flags.entry(format).or_insert(enabled);
        *flag |= enabled;
    }
}

/// Enabled request formats per `(plugin, method)`.
///
/// # Example
///
/// ```
/// use courier_config::EnablementTable;
///
/// let table = EnablementTable::new().enable("node", "post", "json");
///
/// assert!(table.allowed_formats("node", "POST").unwrap().contains("json"));
/// assert!(table.allowed_formats("node", "GET").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTable", into = "RawTable")]
pub struct EnablementTable {
    entries: BTreeMap<String, BTreeMap<String, FormatSet>>,
}

impl EnablementTable {
    /// Creates an empty table, which allows every format everywhere.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables a format for `(plugin, method)`. The method is uppercased.
    #[must_use]
    pub fn enable(mut self, plugin_id: &str, method: &str, format: &str) -> Self {
        self.method_entry(plugin_id, method).set(format.to_string(), true);
        self
    }

    /// Lists a format as disabled for `(plugin, method)`.
    ///
    /// The entry becomes restricted even if nothing is enabled. A format
    /// already enabled stays enabled.
    #[must_use]
    pub fn disable(mut self, plugin_id: &str, method: &str, format: &str) -> Self {
        self.method_entry(plugin_id, method).set(format.to_string(), false);
        self
    }

    /// Declares `(plugin, method)` with no format keys.
    #[must_use]
    pub fn declare(mut self, plugin_id: &str, method: &str) -> Self {
        self.method_entry(plugin_id, method);
        self
    }

    fn method_entry(&mut self, plugin_id: &str, method: &str) -> &mut FormatSet {
        self.entries
            .entry(plugin_id.to_string())
            .or_default()
            .entry(method.to_ascii_uppercase())
            .or_default()
    }

    /// Returns the formats configured for `(plugin, method)`.
    ///
    /// `None` means no entry exists. An entry may also be an empty set.
    #[must_use]
    pub fn allowed_formats(&self, plugin_id: &str, method: &str) -> Option<&FormatSet> {
        let methods = self.entries.get(plugin_id)?;
        match methods.get(method) {
            Some(formats) => Some(formats),
            None => methods.get(&method.to_ascii_uppercase()),
        }
    }

    /// Returns true if no plugin is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the configured plugin ids.
    pub fn plugins(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Checks that every method key is a valid HTTP method token.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (plugin_id, methods) in &self.entries {
            for method in methods.keys() {
                if http::Method::from_bytes(method.as_bytes()).is_err() {
                    return Err(ConfigError::invalid_value(
                        format!("resources.{plugin_id}.{method}"),
                        "not a valid HTTP method",
                    ));
                }
            }
        }
        Ok(())
    }
}

impl From<RawTable> for EnablementTable {
    fn from(raw: RawTable) -> Self {
        let entries = raw
            .into_iter()
            .map(|(plugin_id, methods)| {
                let mut normalized: BTreeMap<String, FormatSet> = BTreeMap::new();
                for (method, formats) in methods {
                    let entry = normalized.entry(method.to_ascii_uppercase()).or_default();
                    for (format, enabled) in formats {
                        entry.set(format, enabled);
                    }
                }
                (plugin_id, normalized)
            })
            .collect();
        Self { entries }
    }
}

impl From<EnablementTable> for RawTable {
    fn from(table: EnablementTable) -> Self {
        table
            .entries
            .into_iter()
            .map(|(plugin_id, methods)| {
                let methods = methods
                    .into_iter()
                    .map(|(method, formats)| (method, formats.flags))
                    .collect();
                (plugin_id, methods)
            })
            .collect()
    }
}
