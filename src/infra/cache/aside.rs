//! Cache-aside helper shared by the repositories.
//!
//! Reads try the cache first and fall back to a loader. Cache trouble of any
//! kind (backend down, undecodable payload) degrades to a miss and is only
//! logged; store errors from the loader are returned untouched.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use super::CacheStore;
use crate::config::CACHE_COLLECTION_MARKER;
use crate::errors::AppResult;

/// Cache handle scoped to one key prefix (`users:`, `subjects:`).
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    prefix: &'static str,
    ttl: Duration,
}

impl CacheAside {
    pub fn new(store: Arc<dyn CacheStore>, prefix: &'static str, ttl: Duration) -> Self {
        Self { store, prefix, ttl }
    }

    /// Full key for `suffix` under this prefix.
    pub fn key(&self, suffix: impl std::fmt::Display) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    /// Key for a collection read, e.g. `users:all_page1_limit10_...`.
    pub fn collection_key(&self, signature: &str) -> String {
        if signature.is_empty() {
            self.key(CACHE_COLLECTION_MARKER)
        } else {
            format!("{}{}_{}", self.prefix, CACHE_COLLECTION_MARKER, signature)
        }
    }

    /// Read `key`, loading and caching the value on a miss.
    pub async fn fetch<T, F, Fut>(&self, key: &str, load: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(hit) = self.lookup(key).await {
            return Ok(hit);
        }

        let value = load().await?;
        self.store_value(key, &value).await;
        Ok(value)
    }

    /// Like [`fetch`](Self::fetch) for loaders that may find nothing.
    /// An absent value is not cached.
    pub async fn fetch_optional<T, F, Fut>(&self, key: &str, load: F) -> AppResult<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Option<T>>>,
    {
        if let Some(hit) = self.lookup(key).await {
            return Ok(Some(hit));
        }

        let value = load().await?;
        if let Some(found) = &value {
            self.store_value(key, found).await;
        }
        Ok(value)
    }

    /// Drop the per-entity key and every collection key of this prefix.
    pub async fn invalidate_entity(&self, id: impl std::fmt::Display) {
        self.invalidate(&self.key(id)).await;
        self.invalidate_collections().await;
    }

    /// Drop every collection key of this prefix.
    async fn invalidate_collections(&self) {
        let pattern = format!("{}{}*", self.prefix, CACHE_COLLECTION_MARKER);
        self.invalidate_pattern(&pattern).await;
    }

    /// Drop every key of this prefix, entities and collections alike.
    pub async fn invalidate_all(&self) {
        let pattern = format!("{}*", self.prefix);
        self.invalidate_pattern(&pattern).await;
    }

    /// Delete a single key, logging failures.
    pub async fn invalidate(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Cache invalidation failed");
        }
    }

    /// Delete every key of this prefix. Unlike invalidation, failures are
    /// returned to the caller.
    pub async fn clear(&self) -> AppResult<u64> {
        let pattern = format!("{}*", self.prefix);
        let removed = self.store.delete_pattern(&pattern).await?;
        tracing::info!(prefix = %self.prefix, removed, "Cache cleared");
        Ok(removed)
    }

    async fn invalidate_pattern(&self, pattern: &str) {
        match self.store.delete_pattern(pattern).await {
            Ok(removed) => tracing::debug!(pattern = %pattern, removed, "Cache keys invalidated"),
            Err(e) => tracing::warn!(pattern = %pattern, error = %e, "Cache invalidation failed"),
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!(key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                tracing::debug!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cached value is unreadable, treating as miss");
                None
            }
        }
    }

    async fn store_value<T: Serialize>(&self, key: &str, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache serialization failed");
                return;
            }
        };

        if let Err(e) = self.store.set(key, &bytes, self.ttl).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::errors::AppError;
    use crate::infra::cache::MemoryCache;

    fn aside(store: Arc<dyn CacheStore>) -> CacheAside {
        CacheAside::new(store, "users:", Duration::from_secs(60))
    }

    /// Backend that fails every call.
    struct DownCache;

    #[async_trait]
    impl CacheStore for DownCache {
        async fn get(&self, _: &str) -> AppResult<Option<Vec<u8>>> {
            Err(AppError::cache("connection refused"))
        }
        async fn set(&self, _: &str, _: &[u8], _: Duration) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
        async fn delete(&self, _: &str) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
        async fn delete_pattern(&self, _: &str) -> AppResult<u64> {
            Err(AppError::cache("connection refused"))
        }
        async fn ping(&self) -> AppResult<()> {
            Err(AppError::cache("connection refused"))
        }
    }

    #[test]
    fn test_keys() {
        let cache = aside(Arc::new(MemoryCache::new()));
        assert_eq!(cache.key(7), "users:7");
        assert_eq!(cache.collection_key(""), "users:all");
        assert_eq!(
            cache.collection_key("page1_limit10_name_start_end"),
            "users:all_page1_limit10_name_start_end"
        );
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let cache = aside(Arc::new(MemoryCache::new()));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: String = cache
                .fetch("users:1", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("ton".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "ton");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_value_is_not_cached() {
        let memory = MemoryCache::new();
        let cache = aside(Arc::new(memory.clone()));

        let value: Option<String> = cache.fetch_optional("users:9", || async { Ok(None) }).await.unwrap();

        assert!(value.is_none());
        assert!(!memory.contains("users:9").await);
    }

    #[tokio::test]
    async fn test_unreadable_entry_falls_back_to_loader() {
        let memory = MemoryCache::new();
        memory
            .set("users:1", b"not json", Duration::from_secs(60))
            .await
            .unwrap();
        let cache = aside(Arc::new(memory.clone()));

        let value: u32 = cache.fetch("users:1", || async { Ok(42) }).await.unwrap();

        assert_eq!(value, 42);
        assert_eq!(memory.get("users:1").await.unwrap(), Some(b"42".to_vec()));
    }

    #[tokio::test]
    async fn test_loader_error_propagates() {
        let cache = aside(Arc::new(MemoryCache::new()));

        let result: AppResult<u32> = cache
            .fetch("users:1", || async { Err(AppError::not_found("User")) })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_store() {
        let cache = aside(Arc::new(DownCache));

        let value: u32 = cache.fetch("users:1", || async { Ok(5) }).await.unwrap();
        assert_eq!(value, 5);

        // invalidation swallows errors, clear surfaces them
        cache.invalidate_entity(1).await;
        assert!(matches!(cache.clear().await, Err(AppError::Cache(_))));
    }

    #[tokio::test]
    async fn test_invalidate_entity_keeps_other_entities() {
        let memory = MemoryCache::new();
        let cache = aside(Arc::new(memory.clone()));
        let ttl = Duration::from_secs(60);
        memory.set("users:1", b"1", ttl).await.unwrap();
        memory.set("users:2", b"2", ttl).await.unwrap();
        memory.set("users:all_page1", b"[]", ttl).await.unwrap();

        cache.invalidate_entity(1).await;

        assert!(!memory.contains("users:1").await);
        assert!(!memory.contains("users:all_page1").await);
        assert!(memory.contains("users:2").await);
    }

    #[tokio::test]
    async fn test_clear_removes_only_own_prefix() {
        let memory = MemoryCache::new();
        let cache = aside(Arc::new(memory.clone()));
        let ttl = Duration::from_secs(60);
        memory.set("users:1", b"1", ttl).await.unwrap();
        memory.set("users:all_page1", b"[]", ttl).await.unwrap();
        memory.set("subjects:1", b"1", ttl).await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(memory.contains("subjects:1").await);
    }
}
