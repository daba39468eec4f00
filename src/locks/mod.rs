//! Per-resource request locks.
//!
//! Mutating requests against the same remote resource must not run
//! concurrently, while requests against different resources should. This
//! module provides:
//!
//! - [`WeakMutexPool`]: one mutex per key, reclaimed once nobody holds it
//! - [`ResourceLockManager`]: the shared handle the transport locks through
//! - [`ResourceKey`] and [`RequestOptions`]: how a request names the resource
//!   it mutates
//! - [`ResourceGuard`]: proof of exclusive use, released on drop
//!
//! # Usage Contract
//!
//! Before sending a mutating request, the transport calls
//! [`ResourceLockManager::acquire`] with the request's options. If a key is
//! attached it gets back a guard and holds it until the response has been
//! read, on success and failure alike. Reads and keyless requests are never
//! serialized.
//!
//! Lock acquisition has no timeout. Holders are bounded by the transport's
//! own request deadline (see [`ClientConfig::timeout`](crate::ClientConfig::timeout)).
//! Waiters are not served in any guaranteed order.
//!
//! # Example
//!
//! ```rust
//! use api_client::{RequestOptions, ResourceKey, ResourceLockManager};
//!
//! # tokio_test::block_on(async {
//! let locks = ResourceLockManager::new();
//! let options = RequestOptions::new().with_resource_key(ResourceKey::new("store-1").unwrap());
//!
//! let guard = locks.acquire(&options).await;
//! assert!(guard.is_some());
//! // ... send the request and read the response ...
//! drop(guard);
//!
//! // Keyless requests are not locked.
//! assert!(locks.acquire(&RequestOptions::new()).await.is_none());
//! # });
//! ```

mod key;
mod pool;

pub use key::{RequestOptions, ResourceKey};
pub use pool::{KeyMutex, WeakMutexPool};

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

/// Shared handle to a [`WeakMutexPool`].
///
/// Cloning is cheap and every clone locks through the same pool, so one
/// manager is created per process (or per test) and handed to each client
/// that needs it.
#[derive(Clone, Debug, Default)]
pub struct ResourceLockManager {
    pool: Arc<WeakMutexPool>,
}

impl ResourceLockManager {
    /// Creates a manager with an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mutex for `key`.
    ///
    /// See [`WeakMutexPool::get`] for identity and reclamation rules.
    #[must_use]
    pub fn get(&self, key: &ResourceKey) -> Arc<KeyMutex> {
        self.pool.get(key.as_ref())
    }

    /// Waits for exclusive use of `key` and returns the guard.
    pub async fn lock(&self, key: &ResourceKey) -> ResourceGuard {
        let mutex = self.get(key);
        let guard = match Arc::clone(&mutex).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::debug!(resource_key = %key, "waiting for resource lock");
                mutex.lock_owned().await
            }
        };
        tracing::debug!(resource_key = %key, "acquired resource lock");

        ResourceGuard {
            key: key.clone(),
            _guard: guard,
        }
    }

    /// Locks the resource named by `options`, if any.
    ///
    /// Returns `None` without waiting when no key is attached.
    pub async fn acquire(&self, options: &RequestOptions) -> Option<ResourceGuard> {
        match options.resource_key() {
            Some(key) => Some(self.lock(key).await),
            None => None,
        }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &WeakMutexPool {
        &self.pool
    }
}

/// Exclusive use of one resource key.
///
/// The lock is released when the guard is dropped.
#[derive(Debug)]
#[must_use = "the resource is unlocked as soon as the guard is dropped"]
pub struct ResourceGuard {
    key: ResourceKey,
    _guard: OwnedMutexGuard<()>,
}

impl ResourceGuard {
    /// Returns the key this guard holds.
    pub const fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Releases the lock. Same as dropping the guard.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        tracing::debug!(resource_key = %self.key, "released resource lock");
    }
}

// Verify the lock types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceLockManager>();
    assert_send_sync::<ResourceGuard>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn key(value: &str) -> ResourceKey {
        ResourceKey::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_acquire_without_key_returns_none() {
        let locks = ResourceLockManager::new();
        assert!(locks.acquire(&RequestOptions::new()).await.is_none());
        assert!(locks.pool().is_empty());
    }

    #[tokio::test]
    async fn test_acquire_with_key_holds_the_mutex() {
        let locks = ResourceLockManager::new();
        let options = RequestOptions::from(key("store-1"));

        let guard = locks.acquire(&options).await.unwrap();
        assert_eq!(guard.key().as_ref(), "store-1");
        assert!(locks.get(&key("store-1")).try_lock().is_err());

        guard.release();
        assert!(locks.get(&key("store-1")).try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_one_pool() {
        let locks = ResourceLockManager::new();
        let other = locks.clone();

        let held = locks.get(&key("k"));
        assert!(Arc::ptr_eq(&held, &other.get(&key("k"))));
    }

    #[tokio::test]
    async fn test_guard_drop_releases_lock() {
        let locks = ResourceLockManager::new();
        {
            let _guard = locks.lock(&key("k")).await;
            assert_eq!(locks.pool().live_len(), 1);
        }
        assert_eq!(locks.pool().live_len(), 0);
        let _again = locks.lock(&key("k")).await;
    }

    #[test]
    fn test_dropped_guard_logs_release() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tokio_test::block_on(async {
                let locks = ResourceLockManager::new();
                let explicit = locks.lock(&key("a")).await;
                explicit.release();
                let dropped = locks.lock(&key("b")).await;
                drop(dropped);
            });
        });

        let output = logs.contents();
        assert_eq!(output.matches("acquired resource lock").count(), 2);
        assert_eq!(output.matches("released resource lock").count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_critical_sections_never_overlap() {
        let locks = ResourceLockManager::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(&key("shared")).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_different_keys_run_in_parallel() {
        let locks = ResourceLockManager::new();
        let first = locks.lock(&key("a")).await;

        // Would hang if "b" contended with "a".
        let second = tokio::time::timeout(Duration::from_secs(1), locks.lock(&key("b")))
            .await
            .unwrap();

        assert_eq!(first.key().as_ref(), "a");
        assert_eq!(second.key().as_ref(), "b");
    }

    #[tokio::test]
    async fn test_waiter_proceeds_after_release() {
        let locks = ResourceLockManager::new();
        let guard = locks.lock(&key("k")).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move { locks.lock(&key("k")).await.key().to_string() })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert_eq!(waiter.await.unwrap(), "k");
    }

    #[tokio::test]
    async fn test_lock_after_reclamation_does_not_deadlock() {
        let locks = ResourceLockManager::new();
        drop(locks.lock(&key("k")).await);
        assert_eq!(locks.pool().live_len(), 0);

        let guard = tokio::time::timeout(Duration::from_secs(1), locks.lock(&key("k")))
            .await
            .unwrap();
        assert_eq!(guard.key().as_ref(), "k");
    }
}
