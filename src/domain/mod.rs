//! Domain layer - Core business entities and logic
//!
//! Entities, value objects and the partial-update rules. Nothing in here
//! talks to the database or the cache.

pub mod password;
pub mod subject;
pub mod user;

pub use password::Password;
pub use subject::{Subject, SubjectChanges};
pub use user::{NewUser, User, UserChanges, UserCredentials, UserFilter};
