//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and repositories. They depend on
//! repository traits, so tests swap in mocks.

mod auth_service;
pub mod container;
mod subject_service;
mod user_service;

pub use container::{ServiceContainer, Services};

pub use auth_service::{AuthService, Authenticator, Claims, TokenPair, TokenType};
pub use subject_service::{SubjectManager, SubjectService};
pub use user_service::{CreateUser, UserManager, UserService};
