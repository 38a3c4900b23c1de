//! Cache layer.
//!
//! Repositories never talk to a cache backend directly. They go through
//! [`CacheAside`], which holds an injected `Arc<dyn CacheStore>` handle
//! created once at startup.
//!
//! - `redis_impl`: production backend (`ConnectionManager`, SCAN-based pattern deletes)
//! - `memory`: in-process backend with lazy TTL expiry, for tests and cache-less runs

mod aside;
mod memory;
mod redis_impl;

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::AppResult;

pub use aside::CacheAside;
pub use memory::MemoryCache;
pub use redis_impl::RedisCache;

/// Key/value operations the cache-aside layer needs from a backend.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Raw bytes stored under `key`, if present and not expired.
    async fn get(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Store `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> AppResult<()>;

    /// Remove a single key. Missing keys are not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Remove every key matching a glob pattern (`*` wildcard).
    /// Returns the number of keys removed.
    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64>;

    /// Check connectivity.
    async fn ping(&self) -> AppResult<()>;
}

/// Glob match supporting only the `*` wildcard, as used in cache patterns.
pub(crate) fn pattern_matches(pattern: &str, key: &str) -> bool {
    let mut segments = pattern.split('*');
    // split always yields at least one segment
    let first = segments.next().unwrap_or_default();
    if !key.starts_with(first) {
        return false;
    }

    let rest: Vec<&str> = segments.collect();
    let Some((last, middle)) = rest.split_last() else {
        return key == first;
    };

    let mut remaining = &key[first.len()..];
    for segment in middle {
        match remaining.find(segment) {
            Some(pos) => remaining = &remaining[pos + segment.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}
