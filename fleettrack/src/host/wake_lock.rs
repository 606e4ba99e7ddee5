//! Screen wake lock.
//!
//! Keeping the screen awake is advisory: a session runs without it when the
//! host has no wake lock or refuses the request.

use std::fmt;
use std::future::Future;

/// Errors from a wake lock request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WakeLockError {
    #[error("Wake lock not supported on this host")]
    Unsupported,

    #[error("Wake lock request denied: {0}")]
    Denied(String),
}

/// Host handle for an acquired wake lock.
pub trait WakeLockSentinel: Send + 'static {
    /// Give the lock back to the host.
    fn release(self: Box<Self>);
}

/// Owns an acquired wake lock and releases it exactly once.
///
/// Release happens on [`release`](Self::release) or on drop, whichever
/// comes first.
pub struct WakeLockGuard {
    sentinel: Option<Box<dyn WakeLockSentinel>>,
}

impl WakeLockGuard {
    pub fn new(sentinel: impl WakeLockSentinel) -> Self {
        Self {
            sentinel: Some(Box::new(sentinel)),
        }
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(sentinel) = self.sentinel.take() {
            sentinel.release();
            tracing::debug!("Wake lock released");
        }
    }
}

impl Drop for WakeLockGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for WakeLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakeLockGuard")
            .field("held", &self.sentinel.is_some())
            .finish()
    }
}

/// Host wake lock capability.
pub trait WakeLock: Send + Sync + 'static {
    /// Probe whether the host offers a wake lock.
    fn is_supported(&self) -> bool;

    /// Ask the host to keep the screen on.
    fn request(&self) -> impl Future<Output = Result<WakeLockGuard, WakeLockError>> + Send;
}

/// Wake lock for hosts that have none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWakeLock;

impl WakeLock for NoWakeLock {
    fn is_supported(&self) -> bool {
        false
    }

    async fn request(&self) -> Result<WakeLockGuard, WakeLockError> {
        Err(WakeLockError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counted(Arc<AtomicUsize>);

    impl WakeLockSentinel for Counted {
        fn release(self: Box<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let releases = Arc::new(AtomicUsize::new(0));
        {
            let _guard = WakeLockGuard::new(Counted(Arc::clone(&releases)));
        }
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_release_happens_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let guard = WakeLockGuard::new(Counted(Arc::clone(&releases)));
        guard.release();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_wake_lock() {
        let lock = NoWakeLock;
        assert!(!lock.is_supported());
        assert!(matches!(
            lock.request().await,
            Err(WakeLockError::Unsupported)
        ));
    }
}
