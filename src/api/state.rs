//! Application state shared by every handler.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{CacheStore, Database};
use crate::services::{AuthService, ServiceContainer, Services, SubjectService, UserService};

/// Application state containing all services.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub subject_service: Arc<dyn SubjectService>,
    /// Cache backend, for health checks
    pub cache: Arc<dyn CacheStore>,
    /// Database connection, for health checks
    pub database: Arc<Database>,
}

impl AppState {
    /// Build services around the database and cache handles.
    pub fn from_config(database: Arc<Database>, cache: Arc<dyn CacheStore>, config: Config) -> Self {
        let services = Services::from_parts(database.connection().clone(), cache.clone(), config);
        Self::from_container(&services, cache, database)
    }

    /// Take the services out of any container (real or mock).
    pub fn from_container(
        container: &dyn ServiceContainer,
        cache: Arc<dyn CacheStore>,
        database: Arc<Database>,
    ) -> Self {
        Self {
            auth_service: container.auth(),
            user_service: container.users(),
            subject_service: container.subjects(),
            cache,
            database,
        }
    }
}
