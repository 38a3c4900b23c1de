//! Infrastructure layer - External systems integration
//!
//! - Database connection and migrations
//! - Repositories (store access with cache-aside reads)
//! - Cache backends (Redis, in-memory)

pub mod cache;
pub mod db;
pub mod repositories;

pub use cache::{CacheAside, CacheStore, MemoryCache, RedisCache};
pub use db::{Database, Migrator};
pub use repositories::{SubjectRepository, SubjectStore, UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockSubjectRepository, MockUserRepository};
