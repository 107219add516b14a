//! Generic TTL cache shared by all data-fetching paths
//!
//! A miss covers both "never set" and "expired" — callers cannot tell the
//! two apart, which is intentional: expiry and explicit invalidation both
//! mean "go refetch". The fallback chain additionally uses
//! [`TtlCache::get_ignore_ttl`] to recover a last-known-good value when
//! every upstream provider has failed.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// Concurrent key→value store with per-entry expiry.
///
/// Safe to share across worker tasks; a lost update between "miss, fetch,
/// set" races is acceptable (last writer wins) since values are idempotent
/// re-fetches of the same upstream fact.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    inner: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value; entries past their TTL are reported as a miss.
    pub async fn get(&self, key: &K) -> Option<V> {
        let guard = self.inner.read().await;
        let entry = guard.get(key)?;
        if entry.is_expired(Instant::now()) {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Look up a value even when expired; the flag reports expiry so the
    /// caller can mark the result stale.
    pub async fn get_ignore_ttl(&self, key: &K) -> Option<(V, bool)> {
        let guard = self.inner.read().await;
        let entry = guard.get(key)?;
        Some((entry.value.clone(), entry.is_expired(Instant::now())))
    }

    pub async fn set(&self, key: K, value: V, ttl: Duration) {
        let mut guard = self.inner.write().await;
        guard.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    pub async fn invalidate(&self, key: &K) {
        let mut guard = self.inner.write().await;
        guard.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn returns_value_before_expiry() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache
            .set("k".to_string(), 42, Duration::from_secs(60))
            .await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&"k".to_string()).await, Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_a_miss() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache
            .set("k".to_string(), 42, Duration::from_secs(60))
            .await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get(&"k".to_string()).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn ignore_ttl_recovers_expired_value() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache
            .set("k".to_string(), 42, Duration::from_secs(10))
            .await;

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get(&"k".to_string()).await, None);
        assert_eq!(cache.get_ignore_ttl(&"k".to_string()).await, Some((42, true)));
    }

    #[tokio::test]
    async fn invalidate_removes_entry_entirely() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache
            .set("k".to_string(), 42, Duration::from_secs(60))
            .await;
        cache.invalidate(&"k".to_string()).await;

        assert_eq!(cache.get(&"k".to_string()).await, None);
        assert_eq!(cache.get_ignore_ttl(&"k".to_string()).await, None);
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.set("k".to_string(), 1, Duration::from_secs(60)).await;
        cache.set("k".to_string(), 2, Duration::from_secs(60)).await;
        assert_eq!(cache.get(&"k".to_string()).await, Some(2));
    }
}
