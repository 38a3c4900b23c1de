//! Repository layer - Data access abstraction
//!
//! Repositories own the cache-aside logic: reads go through the cache,
//! writes go to the store and invalidate afterwards.

pub mod entities;
mod subject_repository;
mod user_repository;

pub use subject_repository::{SubjectRepository, SubjectStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use subject_repository::MockSubjectRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
