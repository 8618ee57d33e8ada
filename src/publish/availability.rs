//! Process-wide "local signing backend available" cache

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use tokio::sync::Mutex;

const UNKNOWN: u8 = 0;
const AVAILABLE: u8 = 1;
const UNAVAILABLE: u8 = 2;

/// Tri-state availability flag resolved at most once.
///
/// The first caller runs the check while holding the lock; concurrent callers
/// wait on the lock and then read the cached answer. Once resolved, reads
/// never touch the lock.
pub struct BackendAvailability {
    state: AtomicU8,
    check_lock: Mutex<()>,
    checks: AtomicU64,
}

impl BackendAvailability {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(UNKNOWN),
            check_lock: Mutex::new(()),
            checks: AtomicU64::new(0),
        }
    }

    /// Already resolved, e.g. when the host knows the answer up front
    pub fn resolved(available: bool) -> Self {
        let cache = Self::new();
        cache.store(available);
        cache
    }

    /// Cached answer, `None` until the first check completes
    pub fn cached(&self) -> Option<bool> {
        match self.state.load(Ordering::Acquire) {
            AVAILABLE => Some(true),
            UNAVAILABLE => Some(false),
            _ => None,
        }
    }

    /// How many times the check actually ran
    pub fn checks(&self) -> u64 {
        self.checks.load(Ordering::Relaxed)
    }

    fn store(&self, available: bool) {
        let state = if available { AVAILABLE } else { UNAVAILABLE };
        self.state.store(state, Ordering::Release);
    }

    pub async fn get_or_check<F, Fut>(&self, check: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        if let Some(available) = self.cached() {
            return available;
        }

        let _guard = self.check_lock.lock().await;
        if let Some(available) = self.cached() {
            return available;
        }

        self.checks.fetch_add(1, Ordering::Relaxed);
        let available = check().await;
        if available {
            tracing::debug!("Local signing backend available");
        } else {
            tracing::warn!("Local signing backend unavailable, local-key publishing disabled");
        }
        self.store(available);
        available
    }
}

impl Default for BackendAvailability {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_check_runs_once() {
        let cache = BackendAvailability::new();
        assert_eq!(cache.cached(), None);

        assert!(cache.get_or_check(|| async { true }).await);
        assert!(cache.get_or_check(|| async { false }).await);
        assert_eq!(cache.cached(), Some(true));
        assert_eq!(cache.checks(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_single_check() {
        let cache = Arc::new(BackendAvailability::new());
        let probes = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let probes = probes.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_check(|| async move {
                        probes.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        false
                    })
                    .await
            }));
        }

        for handle in handles {
            assert!(!handle.await.unwrap());
        }
        assert_eq!(probes.load(Ordering::SeqCst), 1);
        assert_eq!(cache.checks(), 1);
    }

    #[tokio::test]
    async fn test_resolved_skips_check() {
        let cache = BackendAvailability::resolved(false);
        assert!(!cache.get_or_check(|| async { true }).await);
        assert_eq!(cache.checks(), 0);
    }
}
