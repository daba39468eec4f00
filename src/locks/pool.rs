//! Weak-reference mutex pool.
//!
//! [`WeakMutexPool`] hands out one async mutex per key. The pool only keeps
//! [`Weak`] handles, so a mutex lives exactly as long as some caller holds the
//! [`Arc`] returned by [`WeakMutexPool::get`]. Dead handles are replaced the
//! next time their key is requested; nothing sweeps the map in the background.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// The per-key mutex handed out by the pool.
///
/// It guards no data: holding it only means "this process has exclusive use of
/// the resource right now". It is a tokio mutex because the guard is held
/// across an HTTP round trip.
pub type KeyMutex = tokio::sync::Mutex<()>;

/// Maps string keys to mutexes without keeping those mutexes alive.
///
/// Two calls to [`get`](Self::get) with the same key return the same mutex for
/// as long as any earlier result for that key is still alive. Different keys
/// always get independent mutexes.
///
/// The map itself is guarded by a separate `std::sync::Mutex` whose critical
/// section is a single lookup or insert, so pool bookkeeping never waits on a
/// resource lock.
///
/// # Memory
///
/// The map holds one entry per distinct key ever requested. Dead entries are
/// overwritten on their next lookup rather than removed, so the map does not
/// shrink unless [`prune`](Self::prune) is called.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use api_client::locks::WeakMutexPool;
///
/// let pool = WeakMutexPool::new();
/// let a = pool.get("store-1");
/// let b = pool.get("store-1");
/// let c = pool.get("store-2");
///
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(!Arc::ptr_eq(&a, &c));
/// ```
#[derive(Debug, Default)]
pub struct WeakMutexPool {
    entries: Mutex<HashMap<String, Weak<KeyMutex>>>,
}

impl WeakMutexPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex for `key`, creating it if no live one exists.
    ///
    /// The returned [`Arc`] is what keeps the mutex alive. Once every clone of
    /// it is dropped the next call for `key` creates a fresh mutex.
    #[must_use]
    pub fn get(&self, key: &str) -> Arc<KeyMutex> {
        let mut entries = self.entries();

        if let Some(existing) = entries.get(key).and_then(Weak::upgrade) {
            return existing;
        }

        let mutex = Arc::new(KeyMutex::new(()));
        let replaced = entries.insert(key.to_string(), Arc::downgrade(&mutex));
        tracing::trace!(key, reused_slot = replaced.is_some(), "created resource mutex");
        mutex
    }

    /// Returns the number of map entries, including entries whose mutex has
    /// already been dropped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns `true` if no key has ever been requested (or all were pruned).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Returns the number of entries whose mutex is still held by a caller.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.entries()
            .values()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// Removes entries whose mutex has been dropped and returns how many were
    /// removed.
    ///
    /// Never called by the pool itself.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.strong_count() > 0);
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "pruned dead resource mutexes");
        }
        removed
    }

    // Every critical section leaves the map consistent, so a poisoned lock is
    // still safe to use.
    fn entries(&self) -> MutexGuard<'_, HashMap<String, Weak<KeyMutex>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Verify WeakMutexPool is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WeakMutexPool>();
};
