//! Durable key/value cache tier.
//!
//! Models the browser-local storage the original client persisted into: a
//! string key/value store scoped to the installation, with no guaranteed
//! capacity. Write failures are tolerated silently (logged at debug) -
//! callers never fail because the durable tier could not persist.
//!
//! [`PersistentCache`] layers the shared get/put/TTL contract on top of a
//! store: values are wrapped in a `{data, fetched_at_ms}` envelope under a
//! prefixed key (e.g. `evolution_chain_25`) and treated as absent once the
//! TTL elapses. Stale envelopes are superseded on the next write, never
//! actively purged.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::cache::Clock;

/// Durable string key/value store with localStorage semantics.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key was never written or is unreadable.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write a value. Failures are non-fatal and must be swallowed.
    fn set_item(&self, key: &str, value: &str);

    /// Remove everything. Best effort.
    fn clear(&self);
}

// ============================================================================
// FileStore
// ============================================================================

/// File-backed store: one file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys come from cache-key builders, but sanitize anyway so a raw
        // URL used as a key cannot escape the directory.
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            log::debug!("store: cannot create {}: {e}", self.dir.display());
            return;
        }
        let path = self.path_for(key);
        if let Err(e) = std::fs::write(&path, value) {
            log::debug!("store: write to {} failed: {e}", path.display());
        }
    }

    fn clear(&self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            log::debug!("store: clear of {} failed: {e}", self.dir.display());
        }
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory store, used in tests and as a fallback when no data
/// directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.insert(key.to_string(), value.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut items) = self.items.lock() {
            items.clear();
        }
    }
}

// ============================================================================
// PersistentCache
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    data: T,
    fetched_at_ms: u64,
}

/// TTL-checked typed view over a [`KeyValueStore`].
///
/// Shares the in-memory tier's contract: `get` treats an envelope as
/// absent once `now - fetched_at >= TTL`, even though the physical entry
/// may remain in storage until overwritten.
pub struct PersistentCache<T> {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
    ttl_ms: u64,
    clock: Arc<dyn Clock>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> PersistentCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a cache writing `<prefix><key>` entries into `store`.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        prefix: impl Into<String>,
        ttl_ms: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            ttl_ms,
            clock,
            _marker: std::marker::PhantomData,
        }
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    /// Read a value if present and still within its TTL window.
    pub fn get(&self, key: &str) -> Option<T> {
        let raw = self.store.get_item(&self.storage_key(key))?;
        let envelope: Envelope<T> = match serde_json::from_str(&raw) {
            Ok(e) => e,
            Err(e) => {
                log::debug!("store: discarding unreadable entry for {key}: {e}");
                return None;
            }
        };

        let age = self.clock.now_millis().saturating_sub(envelope.fetched_at_ms);
        if self.ttl_ms > 0 && age >= self.ttl_ms {
            return None;
        }
        Some(envelope.data)
    }

    /// Write a value with the current timestamp. Failures are swallowed.
    pub fn put(&self, key: &str, value: &T) {
        let envelope = Envelope {
            data: value,
            fetched_at_ms: self.clock.now_millis(),
        };
        match serde_json::to_string(&envelope) {
            Ok(raw) => self.store.set_item(&self.storage_key(key), &raw),
            Err(e) => log::debug!("store: cannot serialize entry for {key}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::ManualClock;

    fn persistent(ttl_ms: u64) -> (PersistentCache<Vec<u32>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = PersistentCache::new(
            Arc::new(MemoryStore::new()),
            "evolution_chain_",
            ttl_ms,
            clock.clone() as Arc<dyn Clock>,
        );
        (cache, clock)
    }

    #[test]
    fn test_round_trip_within_ttl() {
        let (cache, clock) = persistent(1000);
        cache.put("25", &vec![25, 26]);
        clock.advance(999);
        assert_eq!(cache.get("25"), Some(vec![25, 26]));
    }

    #[test]
    fn test_expired_envelope_is_absent_but_not_purged() {
        let clock = Arc::new(ManualClock::new());
        let store = Arc::new(MemoryStore::new());
        let cache: PersistentCache<Vec<u32>> = PersistentCache::new(
            store.clone(),
            "evolution_chain_",
            1000,
            clock.clone() as Arc<dyn Clock>,
        );

        cache.put("25", &vec![25]);
        clock.advance(1000);
        assert!(cache.get("25").is_none());
        // Stale entry remains physically present until overwritten.
        assert!(store.get_item("evolution_chain_25").is_some());
    }

    #[test]
    fn test_unreadable_entry_is_absent() {
        let (cache, _clock) = persistent(1000);
        cache.store.set_item("evolution_chain_25", "not json");
        assert!(cache.get("25").is_none());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("kv"));
        store.set_item("evolution_chain_1", "{\"x\":1}");
        assert_eq!(store.get_item("evolution_chain_1").as_deref(), Some("{\"x\":1}"));
        assert!(store.get_item("missing").is_none());
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("kv"));
        store.set_item("../escape/attempt", "v");
        // The write lands inside the store directory under a sanitized name.
        assert_eq!(store.get_item("../escape/attempt").as_deref(), Some("v"));
        assert!(dir.path().join("kv").exists());
    }

    #[test]
    fn test_file_store_write_failure_is_silent() {
        // Point the store at a path that cannot be a directory.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not dir").unwrap();

        let store = FileStore::new(blocker.join("kv"));
        // Must not panic or error out.
        store.set_item("k", "v");
        assert!(store.get_item("k").is_none());
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        store.set_item("a", "1");
        store.clear();
        assert!(store.get_item("a").is_none());
    }
}
