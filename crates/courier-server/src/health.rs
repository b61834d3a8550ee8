//! Liveness and readiness probes served at `/health` and `/ready`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    status: String,
    service: String,
    version: String,
    uptime_seconds: u64,
}

impl HealthStatus {
    /// Returns the status string, `"healthy"` while the process serves.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the service name.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the service version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the uptime in whole seconds.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.uptime_seconds
    }
}

/// Liveness probe. Always healthy while the server runs.
///
/// ```rust
/// use courier_server::HealthCheck;
///
/// let health = HealthCheck::new("content-api", "1.2.0");
/// assert_eq!(health.status().status(), "healthy");
/// assert_eq!(health.status().service(), "content-api");
/// ```
#[derive(Debug, Clone)]
pub struct HealthCheck {
    service: String,
    version: String,
    started_at: Instant,
}

impl HealthCheck {
    /// Creates a probe reporting `service` and `version`.
    #[must_use]
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
            started_at: Instant::now(),
        }
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            service: self.service.clone(),
            version: self.version.clone(),
            uptime_seconds: self.uptime().as_secs(),
        }
    }

    /// Time since the probe was created.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Body of `GET /ready`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessStatus {
    ready: bool,
    checks: BTreeMap<String, bool>,
}

impl ReadinessStatus {
    /// Returns whether the server accepts traffic.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Returns one named check's result.
    #[must_use]
    pub fn check(&self, name: &str) -> Option<bool> {
        self.checks.get(name).copied()
    }
}

type ReadinessFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Readiness probe.
///
/// Ready when every registered check passes and the server is not
/// shutting down.
///
/// ```rust
/// use courier_server::ReadinessCheck;
///
/// let readiness = ReadinessCheck::new()
///     .add_check("plugins_loaded", || true)
///     .add_check("config_loaded", || false);
///
/// let status = readiness.status();
/// assert!(!status.is_ready());
/// assert_eq!(status.check("plugins_loaded"), Some(true));
/// ```
#[derive(Clone)]
pub struct ReadinessCheck {
    checks: Vec<(String, ReadinessFn)>,
    accepting: Arc<AtomicBool>,
}

impl std::fmt::Debug for ReadinessCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessCheck")
            .field("checks", &self.checks.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("accepting", &self.accepting.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for ReadinessCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessCheck {
    /// Creates a probe with no checks. It is ready.
    #[must_use]
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            accepting: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Adds a named check.
    #[must_use]
    pub fn add_check<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.checks.push((name.into(), Arc::new(check)));
        self
    }

    /// Marks the server as accepting traffic or draining.
    pub fn set_ready(&self, ready: bool) {
        self.accepting.store(ready, Ordering::SeqCst);
    }

    /// Returns whether the server is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.accepting.load(Ordering::SeqCst) && self.checks.iter().all(|(_, check)| check())
    }

    /// Runs every check and reports each result.
    #[must_use]
    pub fn status(&self) -> ReadinessStatus {
        let checks: BTreeMap<String, bool> = self
            .checks
            .iter()
            .map(|(name, check)| (name.clone(), check()))
            .collect();
        let ready = self.accepting.load(Ordering::SeqCst) && checks.values().all(|ok| *ok);
        ReadinessStatus { ready, checks }
    }
}
