//! HTTP request handlers.

pub mod auth_handler;
pub mod subject_handler;
pub mod user_handler;

pub use auth_handler::auth_routes;
pub use subject_handler::subject_routes;
pub use user_handler::user_routes;
