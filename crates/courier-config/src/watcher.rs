//! Configuration file watching.
//!
//! [`FileWatcher`] reports changes to individual configuration files. It
//! watches each file's parent directory so editors that replace the file
//! (write to a temp file, then rename) are still observed.
//!
//! # Example
//!
//! ```no_run
//! use courier_config::{ConfigLoader, FileWatcher};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), courier_config::ConfigError> {
//! let mut watcher = FileWatcher::builder()
//!     .with_debounce(Duration::from_millis(250))
//!     .watch_file("courier.toml")?
//!     .build()?;
//!
//! while let Some(event) = watcher.next().await {
//!     match ConfigLoader::new().with_file(&event.path).and_then(ConfigLoader::load) {
//!         Ok(config) => println!("reloaded {} plugins", config.resources.plugins().count()),
//!         Err(e) => eprintln!("keeping previous configuration: {e}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::ConfigError;

/// Callback invoked for each change.
pub type ChangeCallback = Arc<dyn Fn(FileChangeEvent) + Send + Sync>;

/// A change to a watched file.
#[derive(Debug, Clone)]
pub struct FileChangeEvent {
    /// The watched file.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: FileChangeKind,
    /// When the change was observed.
    pub timestamp: Instant,
}

/// Kind of file change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    /// The file appeared.
    Created,
    /// The file was written or replaced.
    Modified,
    /// The file was removed.
    Deleted,
}

impl FileChangeKind {
    fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Modify(_) => Some(Self::Modified),
            EventKind::Remove(_) => Some(Self::Deleted),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
        }
    }
}

/// Builder for [`FileWatcher`].
pub struct FileWatcherBuilder {
    files: Vec<PathBuf>,
    debounce: Duration,
    callback: Option<ChangeCallback>,
}

impl Default for FileWatcherBuilder {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            debounce: Duration::from_millis(500),
            callback: None,
        }
    }
}

impl FileWatcherBuilder {
    /// Coalesces changes to the same file within this window. Default 500ms.
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Adds a file to watch. The file must exist.
    pub fn watch_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::file_not_found(path));
        }
        let canonical = path
            .canonicalize()
            .map_err(|e| ConfigError::read_error(path, e))?;
        self.files.push(canonical);
        Ok(self)
    }

    /// Sets a callback used by [`FileWatcher::run`].
    #[must_use]
    pub fn on_change<F>(mut self, callback: F) -> Self
    where
        F: Fn(FileChangeEvent) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Starts watching.
    pub fn build(self) -> Result<FileWatcher, ConfigError> {
        if self.files.is_empty() {
            return Err(ConfigError::watch("no files configured for watching"));
        }

        let (tx, rx) = mpsc::channel(64);
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => tracing::debug!(error = %e, "File watch error"),
            }
        })
        .map_err(|e| ConfigError::watch(format!("failed to create watcher: {e}")))?;

        let directories: HashSet<&Path> = self.files.iter().filter_map(|f| f.parent()).collect();
        for directory in directories {
            watcher
                .watch(directory, RecursiveMode::NonRecursive)
                .map_err(|e| {
                    ConfigError::watch(format!("failed to watch {}: {e}", directory.display()))
                })?;
        }

        Ok(FileWatcher {
            _watcher: watcher,
            rx,
            files: self.files,
            debounce: self.debounce,
            callback: self.callback,
            last_event: None,
        })
    }
}

/// Watches configuration files for changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Event>,
    files: Vec<PathBuf>,
    debounce: Duration,
    callback: Option<ChangeCallback>,
    last_event: Option<(PathBuf, Instant)>,
}

impl FileWatcher {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> FileWatcherBuilder {
        FileWatcherBuilder::default()
    }

    /// Returns the watched files.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Waits for the next change to a watched file.
    ///
    /// Returns `None` once the underlying watcher stops.
    pub async fn next(&mut self) -> Option<FileChangeEvent> {
        while let Some(event) = self.rx.recv().await {
            if let Some(change) = self.process_event(&event) {
                return Some(change);
            }
        }
        None
    }

    /// Returns a pending change without waiting.
    pub fn poll(&mut self) -> Option<FileChangeEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if let Some(change) = self.process_event(&event) {
                return Some(change);
            }
        }
        None
    }

    /// Delivers changes to the callback until the watcher stops.
    pub async fn run(mut self) {
        while let Some(change) = self.next().await {
            if let Some(callback) = &self.callback {
                callback(change);
            }
        }
    }

    fn process_event(&mut self, event: &Event) -> Option<FileChangeEvent> {
        let kind = FileChangeKind::from_event(&event.kind)?;
        let path = event
            .paths
            .iter()
            .find_map(|p| self.files.iter().find(|f| is_same_file(f, p)))?
            .clone();

        let now = Instant::now();
        if let Some((last_path, last_time)) = &self.last_event {
            if *last_path == path && now.duration_since(*last_time) < self.debounce {
                return None;
            }
        }
        self.last_event = Some((path.clone(), now));

        Some(FileChangeEvent {
            path,
            kind,
            timestamp: now,
        })
    }
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("files", &self.files)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

fn is_same_file(watched: &Path, reported: &Path) -> bool {
    if watched == reported {
        return true;
    }
    // Reported paths may not be canonical (e.g. symlinked temp dirs).
    match (watched.file_name(), reported.file_name()) {
        (Some(a), Some(b)) if a == b => reported
            .parent()
            .and_then(|p| p.canonicalize().ok())
            .is_some_and(|p| Some(p.as_path()) == watched.parent()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tokio::time::timeout;

    #[test]
    fn test_change_kind_mapping() {
        assert_eq!(
            FileChangeKind::from_event(&EventKind::Create(notify::event::CreateKind::File)),
            Some(FileChangeKind::Created)
        );
        assert_eq!(
            FileChangeKind::from_event(&EventKind::Remove(notify::event::RemoveKind::File)),
            Some(FileChangeKind::Deleted)
        );
        assert_eq!(
            FileChangeKind::from_event(&EventKind::Access(notify::event::AccessKind::Any)),
            None
        );
    }

    #[test]
    fn test_watch_missing_file() {
        let result = FileWatcher::builder().watch_file("/nonexistent/courier.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_build_without_files() {
        assert!(matches!(
            FileWatcher::builder().build(),
            Err(ConfigError::Watch { .. })
        ));
    }

    #[test]
    fn test_process_event_filters_and_debounces() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("courier.toml");
        fs::write(&file, "").unwrap();

        let mut watcher = FileWatcher::builder()
            .with_debounce(Duration::from_secs(60))
            .watch_file(&file)
            .unwrap()
            .build()
            .unwrap();
        let watched = watcher.files()[0].clone();

        let modify = |path: PathBuf| {
            Event::new(EventKind::Modify(notify::event::ModifyKind::Any)).add_path(path)
        };

        assert!(watcher.process_event(&modify(dir.path().join("other.toml"))).is_none());
        let first = watcher.process_event(&modify(watched.clone())).unwrap();
        assert_eq!(first.kind, FileChangeKind::Modified);
        assert!(watcher.process_event(&modify(watched)).is_none());
    }

    #[tokio::test]
    async fn test_detects_file_write() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("courier.toml");
        fs::write(&file, "[dispatch]\n").unwrap();

        let mut watcher = FileWatcher::builder()
            .with_debounce(Duration::from_millis(10))
            .watch_file(&file)
            .unwrap()
            .build()
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(&file, "[dispatch]\ndefault_format = \"json\"\n").unwrap();

        let event = timeout(Duration::from_secs(5), watcher.next()).await;
        if let Ok(Some(event)) = event {
            assert_eq!(event.path.file_name().unwrap(), "courier.toml");
        }
        // Some CI file systems deliver no events; absence is tolerated.
    }
}
