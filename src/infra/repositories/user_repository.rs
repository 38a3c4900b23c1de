//! User repository with cache-aside reads.
//!
//! Writes always hit the store and then invalidate the `users:` keys. Subjects
//! embed their users, so every user write also drops the `subjects:` keys.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, User, UserCredentials, UserFilter};
use crate::errors::{AppError, AppResult};
use crate::infra::cache::CacheAside;
use crate::types::Paginated;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID, served from cache when possible
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>>;

    /// Find user by ID straight from the store
    async fn find_stored(&self, id: i32) -> AppResult<Option<User>>;

    /// Login material for the user with this exact name (store only)
    async fn find_credentials(&self, name: &str) -> AppResult<Option<UserCredentials>>;

    /// One filtered page of users, newest first, with the total match count
    async fn list(&self, filter: &UserFilter) -> AppResult<Paginated<User>>;

    /// Create a new user
    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Persist a merged user record
    async fn update(&self, user: User) -> AppResult<User>;

    /// Delete user by ID
    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Remove every `users:` cache key, returning how many were removed
    async fn clear_cache(&self) -> AppResult<u64>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
    cache: CacheAside,
    subjects_cache: CacheAside,
}

impl UserStore {
    /// `cache` is scoped to `users:`, `subjects_cache` to `subjects:`.
    pub fn new(db: DatabaseConnection, cache: CacheAside, subjects_cache: CacheAside) -> Self {
        Self {
            db,
            cache,
            subjects_cache,
        }
    }

    async fn load(&self, id: i32) -> AppResult<Option<User>> {
        let model = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(User::from))
    }

    async fn load_page(&self, filter: &UserFilter) -> AppResult<Paginated<User>> {
        let mut query = UserEntity::find();

        if let Some(name) = filter.name_filter() {
            query = query.filter(user::Column::Name.contains(name));
        }
        if let Some(from) = filter.created_from() {
            query = query.filter(user::Column::CreatedAt.gte(from));
        }
        if let Some(before) = filter.created_before() {
            query = query.filter(user::Column::CreatedAt.lt(before));
        }

        let total = query.clone().count(&self.db).await?;
        let models = query
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .offset(filter.offset())
            .limit(filter.limit())
            .all(&self.db)
            .await?;

        let users = models.into_iter().map(User::from).collect();
        Ok(Paginated::new(users, filter.page, filter.limit(), total))
    }

    async fn invalidate(&self, id: i32) {
        self.cache.invalidate_entity(id).await;
        self.subjects_cache.invalidate_all().await;
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let key = self.cache.key(id);
        self.cache.fetch_optional(&key, || self.load(id)).await
    }

    async fn find_stored(&self, id: i32) -> AppResult<Option<User>> {
        self.load(id).await
    }

    async fn find_credentials(&self, name: &str) -> AppResult<Option<UserCredentials>> {
        let model = UserEntity::find()
            .filter(user::Column::Name.eq(name))
            .order_by_asc(user::Column::Id)
            .one(&self.db)
            .await?;

        Ok(model.map(UserCredentials::from))
    }

    async fn list(&self, filter: &UserFilter) -> AppResult<Paginated<User>> {
        let key = self.cache.collection_key(&filter.signature());
        self.cache.fetch(&key, || self.load_page(filter)).await
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: NotSet,
            name: Set(user.name),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            subject_id: Set(user.subject_id),
            status: Set(user.status),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        tracing::info!(user_id = model.id, "User created");

        self.invalidate(model.id).await;
        Ok(User::from(model))
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let id = user.id;
        let active_model = ActiveModel {
            id: Set(id),
            name: Set(user.name),
            email: Set(user.email),
            subject_id: Set(user.subject_id),
            status: Set(user.status),
            updated_at: Set(user.updated_at),
            ..Default::default()
        };

        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => AppError::not_found("User"),
            other => AppError::from(other),
        })?;
        tracing::info!(user_id = id, "User updated");

        self.invalidate(id).await;
        Ok(User::from(model))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = UserEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("User"));
        }
        tracing::info!(user_id = id, "User deleted");

        self.invalidate(id).await;
        Ok(())
    }

    async fn clear_cache(&self) -> AppResult<u64> {
        self.cache.clear().await
    }
}
