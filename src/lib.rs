//! Subject roster - users and subjects REST API.
//!
//! CRUD over two related entities stored in PostgreSQL, with every read
//! going through a cache-aside layer (Redis, or an in-process map) and a
//! small JWT login flow.
//!
//! # Architecture Layers
//!
//! - **cli** / **commands**: command-line entry points (`serve`, `migrate`)
//! - **config**: settings from the environment and constants
//! - **domain**: entities, password hashing, partial-update rules
//! - **infra**: database, migrations, cache backends, repositories
//! - **services**: use cases over repository traits
//! - **api**: handlers, extractors, middleware, routes, OpenAPI
//! - **types**: response envelopes and pagination
//! - **errors**: `AppError` and its HTTP mapping
//!
//! # CLI Usage
//!
//! ```bash
//! cargo run -- serve --port 8080
//! cargo run -- migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Password, Subject, User};
pub use errors::{AppError, AppResult};
pub use infra::{CacheStore, MemoryCache, RedisCache};
