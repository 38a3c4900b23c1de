//! In-memory cache backend with LRU eviction.
//!
//! Mirrors the Redis backend's semantics: TTL per entry, glob pattern
//! deletion. Expired entries are dropped lazily on access, and swept before
//! a full cache evicts a live entry.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use super::{pattern_matches, CacheStore};
use crate::config::MEMORY_CACHE_MAX_ENTRIES;
use crate::errors::AppResult;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(MEMORY_CACHE_MAX_ENTRIES) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local cache keyed by string, bounded by entry count.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `capacity` entries; the least recently used
    /// entry is evicted first.
    pub fn with_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.iter().filter(|(_, entry)| !entry.is_expired()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of stored entries, expired ones included.
    pub async fn stored(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether a live entry exists under `key`. Does not touch recency.
    pub async fn contains(&self, key: &str) -> bool {
        let store = self.store.read().await;
        store.peek(key).is_some_and(|entry| !entry.is_expired())
    }
}

fn purge_expired(store: &mut LruCache<String, CacheEntry>) -> usize {
    let expired: Vec<String> = store
        .iter()
        .filter(|(_, entry)| entry.is_expired())
        .map(|(key, _)| key.clone())
        .collect();
    for key in &expired {
        store.pop(key);
    }
    expired.len()
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        let mut store = self.store.write().await;

        let expired = match store.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            store.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()> {
        let entry = CacheEntry {
            value: value.to_vec(),
            expires_at: Instant::now() + ttl,
        };

        let mut store = self.store.write().await;
        if store.len() == store.cap().get() && !store.contains(key) {
            let purged = purge_expired(&mut store);
            if purged > 0 {
                tracing::debug!(purged, "Swept expired memory cache entries");
            }
        }
        store.put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.store.write().await.pop(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        let mut store = self.store.write().await;
        let matching: Vec<(String, bool)> = store
            .iter()
            .filter(|(key, _)| pattern_matches(pattern, key))
            .map(|(key, entry)| (key.clone(), entry.is_expired()))
            .collect();

        let mut removed = 0;
        for (key, expired) in matching {
            store.pop(&key);
            if !expired {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
