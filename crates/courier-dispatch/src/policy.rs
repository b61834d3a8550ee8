//! Format policy.
//!
//! Decides whether a request body in a given format may be sent to a
//! `(plugin, method)` pair. A missing entry or an entry with no format keys
//! places no restriction; otherwise the format must be flagged `true`.

use std::sync::Arc;

use courier_config::EnablementTable;
use parking_lot::RwLock;

/// Returns true if `format` may be used for a request body sent to
/// `(plugin_id, method)`.
///
/// `format` is `None` when the request content type resolves to no known
/// format. Such a body passes only an unrestricted entry.
///
/// # Example
///
/// ```
/// use courier_config::EnablementTable;
/// use courier_dispatch::is_format_allowed;
///
/// let table = EnablementTable::new().enable("node", "POST", "json");
///
/// assert!(is_format_allowed("node", "POST", Some("json"), &table));
/// assert!(!is_format_allowed("node", "POST", Some("hal_json"), &table));
/// assert!(is_format_allowed("node", "PATCH", Some("hal_json"), &table));
/// ```
#[must_use]
pub fn is_format_allowed(
    plugin_id: &str,
    method: &str,
    format: Option<&str>,
    table: &EnablementTable,
) -> bool {
    match table.allowed_formats(plugin_id, method) {
        None => true,
        Some(formats) if formats.is_empty() => true,
        Some(formats) => format.is_some_and(|format| formats.contains(format)),
    }
}

/// The live enablement table.
///
/// Readers take an `Arc` snapshot and release the lock immediately, so a
/// reload never blocks a dispatch in progress and never changes the table
/// a dispatch already looked at.
#[derive(Debug, Default)]
pub struct FormatPolicy {
    table: RwLock<Arc<EnablementTable>>,
}

impl FormatPolicy {
    /// Creates a policy over a table.
    #[must_use]
    pub fn new(table: EnablementTable) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// Returns the current table.
    #[must_use]
    pub fn snapshot(&self) -> Arc<EnablementTable> {
        Arc::clone(&self.table.read())
    }

    /// Replaces the table for subsequent dispatches.
    pub fn replace(&self, table: EnablementTable) {
        let plugins = table.plugins().count();
        *self.table.write() = Arc::new(table);
        tracing::info!(plugins, "Format enablement table replaced");
    }

    /// Checks a request format against the current table.
    #[must_use]
    pub fn allows(&self, plugin_id: &str, method: &str, format: Option<&str>) -> bool {
        is_format_allowed(plugin_id, method, format, &self.snapshot())
    }
}
