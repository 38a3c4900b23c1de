//! Service container - Builds and hands out the application services.

use std::sync::Arc;

use super::{AuthService, Authenticator, SubjectManager, SubjectService, UserManager, UserService};
use crate::config::{Config, CACHE_PREFIX_SUBJECTS, CACHE_PREFIX_USERS};
use crate::infra::{CacheAside, CacheStore, SubjectStore, UserStore};

/// Service container trait for dependency injection.
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn subjects(&self) -> Arc<dyn SubjectService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    subject_service: Arc<dyn SubjectService>,
}

impl Services {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        subject_service: Arc<dyn SubjectService>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            subject_service,
        }
    }

    /// Wire repositories and services around one database connection and
    /// one shared cache backend.
    pub fn from_parts(
        db: sea_orm::DatabaseConnection,
        cache: Arc<dyn CacheStore>,
        config: Config,
    ) -> Self {
        let ttl = config.cache_ttl();
        let users_cache = CacheAside::new(cache.clone(), CACHE_PREFIX_USERS, ttl);
        let subjects_cache = CacheAside::new(cache, CACHE_PREFIX_SUBJECTS, ttl);

        let user_repo = Arc::new(UserStore::new(
            db.clone(),
            users_cache.clone(),
            subjects_cache.clone(),
        ));
        let subject_repo = Arc::new(SubjectStore::new(db, subjects_cache, users_cache));

        Self {
            auth_service: Arc::new(Authenticator::new(user_repo.clone(), config)),
            user_service: Arc::new(UserManager::new(user_repo, subject_repo.clone())),
            subject_service: Arc::new(SubjectManager::new(subject_repo)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn subjects(&self) -> Arc<dyn SubjectService> {
        self.subject_service.clone()
    }
}
