//! In-memory response cache tier.
//!
//! A time-boxed key/value store used to avoid redundant network calls for
//! the same entity across repeated views. Entries are bounded by an LRU
//! capacity and expire lazily on read: once `now - fetched_at >= TTL` a
//! physical entry is treated as absent and popped. There is no eviction
//! thread.
//!
//! The TTL and the clock are injected rather than read from ambient
//! process state, so tests can drive expiry deterministically.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

// ============================================================================
// Clock
// ============================================================================

/// Source of wall-clock time in milliseconds. Injected into both cache
/// tiers so TTL behavior is testable.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Production clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `millis`.
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Default TTL: 5 minutes.
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;

/// Default capacity of the in-memory tier.
pub const DEFAULT_CAPACITY: usize = 256;

/// Configuration for the in-memory cache tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries; least recently used entries are evicted
    /// beyond this.
    pub capacity: usize,
    /// Time-to-live in milliseconds. Zero disables expiry.
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

impl CacheConfig {
    /// Builder method to set the TTL in milliseconds.
    pub fn ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Builder method to set the capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Lookups that found only an expired entry.
    pub expired: u64,
    /// Entries evicted by the capacity bound.
    pub evictions: u64,
    pub current_size: usize,
}

impl CacheStats {
    /// Hit rate in [0, 1]; 0 when no lookups have happened.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// TtlCache
// ============================================================================

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    fetched_at_ms: u64,
}

/// Process-lifetime in-memory cache with lazy TTL expiry.
///
/// Contract: `get(key)` returns the cached value iff called within the TTL
/// window of the `put`; after the window elapses the entry behaves as
/// absent. `clear()` drops everything.
pub struct TtlCache<V: Clone> {
    inner: RwLock<CacheInner<V>>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

struct CacheInner<V> {
    entries: LruCache<String, Entry<V>>,
    stats: CacheStats,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with the given configuration and clock.
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(config.capacity.max(1)).expect("capacity is at least 1");
        Self {
            inner: RwLock::new(CacheInner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            clock,
            config,
        }
    }

    /// Create a cache with the default configuration and the system clock.
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default(), Arc::new(SystemClock))
    }

    /// Look up a key. Expired entries count as misses and are popped.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now_millis();
        let mut inner = self.inner.write().await;

        let fresh = match inner.entries.get(key) {
            Some(entry) => self.is_fresh(entry, now),
            None => {
                inner.stats.misses += 1;
                return None;
            }
        };

        if !fresh {
            inner.entries.pop(key);
            inner.stats.expired += 1;
            inner.stats.misses += 1;
            inner.stats.current_size = inner.entries.len();
            return None;
        }

        inner.stats.hits += 1;
        inner.entries.get(key).map(|e| e.value.clone())
    }

    /// Store a value under a key, superseding any previous entry.
    pub async fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let entry = Entry {
            value,
            fetched_at_ms: self.clock.now_millis(),
        };

        let mut inner = self.inner.write().await;
        if let Some((evicted_key, _)) = inner.entries.push(key.clone(), entry) {
            if evicted_key != key {
                inner.stats.evictions += 1;
            }
        }
        inner.stats.current_size = inner.entries.len();
    }

    /// Drop all entries. Cumulative counters are retained.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.stats.current_size = 0;
    }

    /// Snapshot of the cache counters.
    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    fn is_fresh(&self, entry: &Entry<V>, now: u64) -> bool {
        if self.config.ttl_ms == 0 {
            return true;
        }
        now.saturating_sub(entry.fetched_at_ms) < self.config.ttl_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_cache(ttl_ms: u64) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::new(
            CacheConfig::default().ttl_ms(ttl_ms),
            clock.clone() as Arc<dyn Clock>,
        );
        (cache, clock)
    }

    #[tokio::test]
    async fn test_get_within_ttl_window() {
        let (cache, clock) = manual_cache(1000);
        cache.put("pikachu", "data".to_string()).await;

        clock.advance(999);
        assert_eq!(cache.get("pikachu").await.as_deref(), Some("data"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let (cache, clock) = manual_cache(1000);
        cache.put("pikachu", "data".to_string()).await;

        clock.advance(1000);
        assert!(cache.get("pikachu").await.is_none());
        // The physical entry was popped on the expired read.
        assert!(cache.is_empty().await);

        let stats = cache.stats().await;
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_put_supersedes_stale_entry() {
        let (cache, clock) = manual_cache(1000);
        cache.put("pikachu", "old".to_string()).await;
        clock.advance(2000);

        cache.put("pikachu", "fresh".to_string()).await;
        assert_eq!(cache.get("pikachu").await.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_expiry() {
        let (cache, clock) = manual_cache(0);
        cache.put("pikachu", "data".to_string()).await;
        clock.advance(u64::MAX / 2);
        assert!(cache.get("pikachu").await.is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let (cache, _clock) = manual_cache(1000);
        cache.put("a", "1".to_string()).await;
        cache.put("b", "2".to_string()).await;
        assert_eq!(cache.len().await, 2);

        cache.clear().await;
        assert!(cache.is_empty().await);
        assert!(cache.get("a").await.is_none());
    }

    #[tokio::test]
    async fn test_lru_eviction_counted() {
        let clock = Arc::new(ManualClock::new());
        let cache: TtlCache<String> = TtlCache::new(
            CacheConfig::default().capacity(2).ttl_ms(0),
            clock as Arc<dyn Clock>,
        );

        cache.put("a", "1".to_string()).await;
        cache.put("b", "2".to_string()).await;
        cache.put("c", "3".to_string()).await;

        let stats = cache.stats().await;
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.current_size, 2);
        assert!(cache.get("a").await.is_none());
    }

    #[tokio::test]
    async fn test_hit_rate() {
        let (cache, _clock) = manual_cache(1000);
        cache.put("a", "1".to_string()).await;
        let _ = cache.get("a").await;
        let _ = cache.get("missing").await;

        let stats = cache.stats().await;
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
