//! Graceful shutdown.
//!
//! [`ShutdownSignal`] stops the accept loop and asks open connections to
//! finish; [`ConnectionTracker`] lets the server wait for them to drain.
//!
//! ```rust,no_run
//! use courier_server::ShutdownSignal;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let shutdown = ShutdownSignal::new();
//! tokio::select! {
//!     () = shutdown.recv() => println!("stopping"),
//!     () = tokio::time::sleep(Duration::from_secs(60)) => println!("timeout"),
//! }
//! # }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Notify};

/// A cloneable shutdown trigger.
///
/// All clones observe the same state. Triggering is idempotent.
///
/// # Example
///
/// ```rust
/// use courier_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let other = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(other.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Triggers shutdown.
    pub fn trigger(&self) {
        let was_triggered = self.sender.send_replace(true);
        if !was_triggered {
            tracing::debug!("Shutdown triggered");
        }
    }

    /// Returns true once shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Completes when shutdown is triggered, immediately if it already was.
    pub async fn recv(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Creates a signal triggered by SIGTERM or SIGINT (Ctrl+C elsewhere).
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });
        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Failed to install signal handlers; falling back to Ctrl+C");
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Received Ctrl+C, shutting down");
                }
                return;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
        _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}

/// Counts open connections so shutdown can wait for them.
///
/// ```rust
/// use courier_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection until the returned token is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            active: Arc::clone(&self.active),
            idle: Arc::clone(&self.idle),
        }
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits until no connection is open.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.active.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Held for the lifetime of one connection.
#[derive(Debug)]
pub struct ConnectionToken {
    active: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_signal_starts_untriggered() {
        assert!(!ShutdownSignal::new().is_shutdown());
        assert!(!ShutdownSignal::default().is_shutdown());
    }

    #[test]
    fn test_trigger_is_idempotent_and_shared() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        signal.trigger();
        signal.trigger();
        assert!(clone.is_shutdown());
    }

    #[tokio::test]
    async fn test_recv_completes_after_trigger() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });
        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .expect("recv should complete");
    }

    #[tokio::test]
    async fn test_recv_when_already_triggered() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        tokio::time::timeout(Duration::from_millis(10), signal.recv())
            .await
            .expect("recv should complete immediately");
    }

    #[test]
    fn test_tracker_counts_tokens() {
        let tracker = ConnectionTracker::new();
        let a = tracker.acquire();
        let b = tracker.clone().acquire();
        assert_eq!(tracker.active_connections(), 2);
        drop(a);
        assert_eq!(tracker.active_connections(), 1);
        drop(b);
        assert_eq!(tracker.active_connections(), 0);
    }

    #[tokio::test]
    async fn test_wait_idle_immediate() {
        let tracker = ConnectionTracker::new();
        tokio::time::timeout(Duration::from_millis(10), tracker.wait_idle())
            .await
            .expect("no connections means idle");
    }

    #[tokio::test]
    async fn test_wait_idle_after_last_token() {
        let tracker = ConnectionTracker::new();
        let token = tracker.acquire();
        let waiter = tracker.clone();
        let handle = tokio::spawn(async move { waiter.wait_idle().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(token);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("wait should complete")
            .expect("task should not panic");
    }
}
