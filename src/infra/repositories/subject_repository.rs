//! Subject repository with cache-aside reads.
//!
//! Cached subjects carry their users. Deleting a subject nulls the
//! `subject_id` of those users, so subject writes also reach into `users:`.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use super::entities::{
    subject::{self, ActiveModel, Entity as SubjectEntity},
    user::{Entity as UserEntity, Model as UserModel},
};
use crate::config::CACHE_COLLECTION_MARKER;
use crate::domain::Subject;
use crate::errors::{AppError, AppResult};
use crate::infra::cache::CacheAside;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Subject repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SubjectRepository: Send + Sync {
    /// Find subject by ID with its users, served from cache when possible
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Subject>>;

    /// All subjects ordered by ID, each with its users
    async fn list(&self) -> AppResult<Vec<Subject>>;

    /// Whether a subject with this ID is in the store
    async fn exists(&self, id: i32) -> AppResult<bool>;

    /// Find subject by ID straight from the store, without users
    async fn find_stored(&self, id: i32) -> AppResult<Option<Subject>>;

    /// Create an active subject
    async fn create(&self, name: String) -> AppResult<Subject>;

    /// Persist a merged subject record
    async fn update(&self, subject: Subject) -> AppResult<Subject>;

    /// Delete subject by ID
    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Remove every `subjects:` cache key, returning how many were removed
    async fn clear_cache(&self) -> AppResult<u64>;
}

/// Concrete implementation of SubjectRepository
pub struct SubjectStore {
    db: DatabaseConnection,
    cache: CacheAside,
    users_cache: CacheAside,
}

impl SubjectStore {
    /// `cache` is scoped to `subjects:`, `users_cache` to `users:`.
    pub fn new(db: DatabaseConnection, cache: CacheAside, users_cache: CacheAside) -> Self {
        Self {
            db,
            cache,
            users_cache,
        }
    }

    async fn load_with_users(&self, id: i32) -> AppResult<Option<Subject>> {
        let rows = SubjectEntity::find()
            .filter(subject::Column::Id.eq(id))
            .find_with_related(UserEntity)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().next().map(assemble))
    }

    async fn load_all(&self) -> AppResult<Vec<Subject>> {
        let rows = SubjectEntity::find()
            .order_by_asc(subject::Column::Id)
            .find_with_related(UserEntity)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(assemble).collect())
    }
}

fn assemble((model, mut users): (subject::Model, Vec<UserModel>)) -> Subject {
    users.sort_by_key(|user| user.id);
    model.into_subject(users)
}

#[async_trait]
impl SubjectRepository for SubjectStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Subject>> {
        let key = self.cache.key(id);
        self.cache.fetch_optional(&key, || self.load_with_users(id)).await
    }

    async fn list(&self) -> AppResult<Vec<Subject>> {
        let key = self.cache.key(CACHE_COLLECTION_MARKER);
        self.cache.fetch(&key, || self.load_all()).await
    }

    async fn exists(&self, id: i32) -> AppResult<bool> {
        let count = SubjectEntity::find()
            .filter(subject::Column::Id.eq(id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn find_stored(&self, id: i32) -> AppResult<Option<Subject>> {
        let model = SubjectEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Subject::from))
    }

    async fn create(&self, name: String) -> AppResult<Subject> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: NotSet,
            name: Set(name),
            status: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        tracing::info!(subject_id = model.id, "Subject created");

        self.cache.invalidate_entity(model.id).await;
        Ok(Subject::from(model))
    }

    async fn update(&self, subject: Subject) -> AppResult<Subject> {
        let id = subject.id;
        let active_model = ActiveModel {
            id: Set(id),
            name: Set(subject.name),
            status: Set(subject.status),
            updated_at: Set(subject.updated_at),
            ..Default::default()
        };

        active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => AppError::not_found("Subject"),
            other => AppError::from(other),
        })?;
        tracing::info!(subject_id = id, "Subject updated");

        self.cache.invalidate_entity(id).await;

        self.load_with_users(id)
            .await?
            .ok_or_else(|| AppError::not_found("Subject"))
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = SubjectEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("Subject"));
        }
        tracing::info!(subject_id = id, "Subject deleted");

        self.cache.invalidate_entity(id).await;
        // former members had their subject_id nulled
        self.users_cache.invalidate_all().await;
        Ok(())
    }

    async fn clear_cache(&self) -> AppResult<u64> {
        self.cache.clear().await
    }
}
