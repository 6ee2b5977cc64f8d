//! Request-scoped result caching using Moka.
//!
//! Concurrent loads of the same key are coalesced into one in-flight
//! computation, and results are memoized for a fixed TTL. The cache is an
//! explicit value owned by the caller; nothing here is global.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::warn;

/// Default cache capacity (number of entries).
pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default time-to-live for cache entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Coalescing TTL cache.
///
/// Cloning is cheap; clones share the same storage.
pub struct RequestCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    cache: Cache<K, V>,
}

impl<K, V> RequestCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache with default capacity and TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL)
    }

    /// Creates a cache with custom capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self { cache }
    }

    /// Returns the cached value for `key`, or runs `load` to produce it.
    ///
    /// While a load for `key` is in flight, other callers for the same key
    /// wait for it instead of starting their own. Errors are not cached.
    pub async fn get_or_try_load<F, E>(&self, key: K, load: F) -> Result<V, Arc<E>>
    where
        F: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        self.cache.try_get_with(key, load).await
    }

    /// Returns the cached value without loading.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.cache.get(key).await
    }

    /// Drops one entry.
    pub async fn invalidate(&self, key: &K) {
        self.cache.invalidate(key).await;
    }

    /// Drops every entry matching `predicate`.
    pub fn invalidate_if<P>(&self, predicate: P)
    where
        P: Fn(&K, &V) -> bool + Send + Sync + 'static,
    {
        if let Err(e) = self.cache.invalidate_entries_if(predicate) {
            warn!(error = %e, "Predicate invalidation unavailable, clearing cache");
            self.cache.invalidate_all();
        }
    }

    /// Drops every entry.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the approximate number of entries.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Applies pending evictions and invalidations now.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl<K, V> Clone for RequestCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
        }
    }
}

impl<K, V> Default for RequestCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::task::JoinSet;

    #[tokio::test]
    async fn test_concurrent_loads_are_coalesced() {
        let cache: RequestCache<String, u64> = RequestCache::new();
        let loads = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for _ in 0..8 {
            let cache = cache.clone();
            let loads = Arc::clone(&loads);
            tasks.spawn(async move {
                cache
                    .get_or_try_load("user-1".to_string(), async move {
                        loads.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, std::io::Error>(42)
                    })
                    .await
            });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap().unwrap(), 42);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: RequestCache<u32, u32> = RequestCache::new();

        let err = cache
            .get_or_try_load(1, async { Err::<u32, _>("store down") })
            .await;
        assert!(err.is_err());

        let ok = cache.get_or_try_load(1, async { Ok::<_, &str>(7) }).await;
        assert_eq!(ok.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_invalidate_by_predicate() {
        let cache: RequestCache<(u32, &'static str), u32> = RequestCache::new();
        for key in [(1, "CNY"), (1, "USD"), (2, "CNY")] {
            let _ = cache.get_or_try_load(key, async { Ok::<_, &str>(0) }).await;
        }

        cache.invalidate_if(|key, _| key.0 == 1);
        cache.run_pending_tasks().await;

        assert!(cache.get(&(1, "CNY")).await.is_none());
        assert!(cache.get(&(1, "USD")).await.is_none());
        assert!(cache.get(&(2, "CNY")).await.is_some());
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let cache: RequestCache<u32, u32> =
            RequestCache::with_config(10, Duration::from_millis(20));
        let _ = cache.get_or_try_load(1, async { Ok::<_, &str>(1) }).await;
        assert_eq!(cache.get(&1).await, Some(1));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get(&1).await, None);
    }
}
