//! Live reload of the format enablement table.
//!
//! The reloader watches the configuration file and swaps the `[resources]`
//! table into the dispatcher's [`FormatPolicy`]. Requests already in flight
//! keep the snapshot they started with. A file that fails to parse or
//! validate leaves the current table in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use courier_config::{ConfigError, ConfigLoader, FileChangeEvent, FileChangeKind, FileWatcher};
use courier_dispatch::FormatPolicy;
use tokio::task::JoinHandle;

/// Reloads the enablement table from a configuration file.
#[derive(Debug, Clone)]
pub struct PolicyReloader {
    path: PathBuf,
    policy: Arc<FormatPolicy>,
    env_prefix: Option<String>,
    debounce: Duration,
}

impl PolicyReloader {
    /// Creates a reloader for `path` feeding `policy`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, policy: Arc<FormatPolicy>) -> Self {
        Self {
            path: path.into(),
            policy,
            env_prefix: None,
            debounce: Duration::from_millis(500),
        }
    }

    /// Applies environment overrides with this prefix on each reload.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Sets the watcher debounce window.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Returns the watched file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file once and installs its table.
    ///
    /// On error the current table is kept.
    pub fn reload(&self) -> Result<(), ConfigError> {
        let mut loader = ConfigLoader::new().with_file(&self.path)?;
        if let Some(prefix) = &self.env_prefix {
            loader = loader.with_env_prefix(prefix);
        }
        let config = loader.load()?;
        self.policy.replace(config.resources);
        Ok(())
    }

    /// Watches the file until the watcher stops.
    pub async fn watch(self) -> Result<(), ConfigError> {
        let mut watcher = FileWatcher::builder()
            .with_debounce(self.debounce)
            .watch_file(&self.path)?
            .build()?;
        tracing::info!(path = %self.path.display(), "Watching configuration for policy changes");

        while let Some(event) = watcher.next().await {
            self.apply(&event);
        }
        Ok(())
    }

    /// Handles one change event. Returns true if the table was replaced.
    pub fn apply(&self, event: &FileChangeEvent) -> bool {
        if event.kind == FileChangeKind::Deleted {
            tracing::warn!(path = %event.path.display(), "Configuration file removed, keeping current policy");
            return false;
        }
        match self.reload() {
            Ok(()) => {
                tracing::info!(path = %event.path.display(), "Reloaded format policy");
                true
            }
            Err(e) => {
                tracing::warn!(
                    path = %event.path.display(),
                    error = %e,
                    "Configuration reload failed, keeping current policy"
                );
                false
            }
        }
    }

    /// Runs [`watch`](Self::watch) on the Tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.watch().await {
                tracing::error!(error = %e, "Policy reloader stopped");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::EnablementTable;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("courier.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_reload_replaces_table() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[resources.node.POST]\njson = true\n");
        let policy = Arc::new(FormatPolicy::new(EnablementTable::new()));
        let reloader = PolicyReloader::new(&path, Arc::clone(&policy));

        assert!(policy.allows("node", "POST", Some("hal_json")));
        reloader.reload().unwrap();
        assert!(!policy.allows("node", "POST", Some("hal_json")));
        assert!(policy.allows("node", "POST", Some("json")));
    }

    #[test]
    fn test_invalid_file_keeps_table() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[resources.node.POST]\njson = true\n");
        let policy = Arc::new(FormatPolicy::new(EnablementTable::new()));
        let reloader = PolicyReloader::new(&path, Arc::clone(&policy));
        reloader.reload().unwrap();

        fs::write(&path, "[resources.node.\"PO ST\"]\nhal_json = true\n").unwrap();
        assert!(reloader.reload().is_err());
        assert!(policy.allows("node", "POST", Some("json")));
        assert!(!policy.allows("node", "POST", Some("hal_json")));

        fs::write(&path, "not toml [").unwrap();
        assert!(reloader.reload().is_err());
        assert!(policy.allows("node", "POST", Some("json")));
    }

    #[test]
    fn test_missing_file() {
        let policy = Arc::new(FormatPolicy::new(EnablementTable::new()));
        let reloader = PolicyReloader::new("/nonexistent/courier.toml", policy);
        assert!(matches!(
            reloader.reload(),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    fn event(path: &Path, kind: FileChangeKind) -> FileChangeEvent {
        FileChangeEvent {
            path: path.to_path_buf(),
            kind,
            timestamp: std::time::Instant::now(),
        }
    }

    #[test]
    fn test_apply_modified_event() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[resources.node.POST]\njson = true\n");
        let policy = Arc::new(FormatPolicy::new(EnablementTable::new()));
        let reloader = PolicyReloader::new(&path, Arc::clone(&policy));

        assert!(reloader.apply(&event(&path, FileChangeKind::Modified)));
        assert!(!policy.allows("node", "POST", Some("hal_json")));

        fs::write(&path, "[resources.node.POST]\nhal_json = true\n").unwrap();
        assert!(reloader.apply(&event(&path, FileChangeKind::Created)));
        assert!(policy.allows("node", "POST", Some("hal_json")));
        assert!(!policy.allows("node", "POST", Some("json")));
    }

    #[test]
    fn test_apply_deleted_or_invalid_keeps_table() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[resources.node.POST]\njson = true\n");
        let policy = Arc::new(FormatPolicy::new(EnablementTable::new()));
        let reloader = PolicyReloader::new(&path, Arc::clone(&policy));
        reloader.reload().unwrap();

        fs::write(&path, "[resources.node.POST]\nhal_json = true\n").unwrap();
        assert!(!reloader.apply(&event(&path, FileChangeKind::Deleted)));
        assert!(!policy.allows("node", "POST", Some("hal_json")));

        fs::write(&path, "not toml [").unwrap();
        assert!(!reloader.apply(&event(&path, FileChangeKind::Modified)));
        assert!(policy.allows("node", "POST", Some("json")));
    }

    #[tokio::test]
    #[ignore = "needs file system change events"]
    async fn test_watch_picks_up_change() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[resources.node.POST]\njson = true\n");
        let policy = Arc::new(FormatPolicy::new(EnablementTable::new()));
        let reloader = PolicyReloader::new(&path, Arc::clone(&policy))
            .with_debounce(Duration::from_millis(10));
        reloader.reload().unwrap();
        assert!(!policy.allows("node", "POST", Some("hal_json")));
        let handle = reloader.spawn();

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(&path, "[resources.node.POST]\nhal_json = true\n").unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while tokio::time::Instant::now() < deadline
            && !policy.allows("node", "POST", Some("hal_json"))
        {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();
        assert!(policy.allows("node", "POST", Some("hal_json")));
        assert!(!policy.allows("node", "POST", Some("json")));
    }
}
