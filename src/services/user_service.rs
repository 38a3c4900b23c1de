//! User service - Handles user-related business logic.
//!
//! Owns the partial-update merge and the subject reference check. The merge
//! base always comes from the store, never from the cache.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{NewUser, Password, User, UserChanges, UserFilter};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{SubjectRepository, UserRepository};
use crate::types::Paginated;

/// Input for creating a user; the password is still plain text here.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub subject_id: Option<i32>,
    pub status: Option<bool>,
}

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get user by ID
    async fn get_user(&self, id: i32) -> AppResult<User>;

    /// List users matching the filter, one page at a time
    async fn list_users(&self, filter: UserFilter) -> AppResult<Paginated<User>>;

    /// Create a user, hashing the password
    async fn create_user(&self, input: CreateUser) -> AppResult<User>;

    /// Apply a partial update
    async fn update_user(&self, id: i32, changes: UserChanges) -> AppResult<User>;

    /// Delete user by ID
    async fn delete_user(&self, id: i32) -> AppResult<()>;

    /// Drop every cached user entry
    async fn clear_cache(&self) -> AppResult<u64>;
}

/// Concrete implementation of UserService.
pub struct UserManager {
    users: Arc<dyn UserRepository>,
    subjects: Arc<dyn SubjectRepository>,
}

impl UserManager {
    pub fn new(users: Arc<dyn UserRepository>, subjects: Arc<dyn SubjectRepository>) -> Self {
        Self { users, subjects }
    }

    /// Fail with NotFound unless the referenced subject is in the store.
    async fn ensure_subject(&self, subject_id: i32) -> AppResult<()> {
        if self.subjects.exists(subject_id).await? {
            Ok(())
        } else {
            Err(AppError::subject_not_found(subject_id))
        }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn get_user(&self, id: i32) -> AppResult<User> {
        self.users.find_by_id(id).await?.ok_or_not_found("User")
    }

    async fn list_users(&self, filter: UserFilter) -> AppResult<Paginated<User>> {
        self.users.list(&filter).await
    }

    async fn create_user(&self, input: CreateUser) -> AppResult<User> {
        let subject_id = input.subject_id.filter(|id| *id != 0);
        if let Some(subject_id) = subject_id {
            self.ensure_subject(subject_id).await?;
        }

        let password_hash = Password::new(&input.password)?.into_string();
        self.users
            .create(NewUser {
                name: input.name,
                email: input.email,
                password_hash,
                subject_id,
                status: input.status.unwrap_or(true),
            })
            .await
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> AppResult<User> {
        let mut user = self.users.find_stored(id).await?.ok_or_not_found("User")?;

        if let Some(subject_id) = changes.subject_reference() {
            self.ensure_subject(subject_id).await?;
        }

        changes.apply_to(&mut user);
        self.users.update(user).await
    }

    async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.users.delete(id).await
    }

    async fn clear_cache(&self) -> AppResult<u64> {
        self.users.clear_cache().await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;

    use super::*;
    use crate::infra::{MockSubjectRepository, MockUserRepository};

    fn stored_user(id: i32) -> User {
        let now = Utc::now();
        User {
            id,
            name: "ton".to_string(),
            email: "ton@example.com".to_string(),
            subject_id: None,
            status: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn manager(users: MockUserRepository, subjects: MockSubjectRepository) -> UserManager {
        UserManager::new(Arc::new(users), Arc::new(subjects))
    }

    fn create_input(subject_id: Option<i32>) -> CreateUser {
        CreateUser {
            name: "ton".to_string(),
            email: "ton@example.com".to_string(),
            password: "SecurePassword123".to_string(),
            subject_id,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().with(eq(9)).returning(|_| Ok(None));

        let result = manager(users, MockSubjectRepository::new()).get_user(9).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_with_missing_subject_writes_nothing() {
        let mut users = MockUserRepository::new();
        users.expect_create().never();
        let mut subjects = MockSubjectRepository::new();
        subjects.expect_exists().with(eq(42)).returning(|_| Ok(false));

        let err = manager(users, subjects)
            .create_user(create_input(Some(42)))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "subject with ID: 42 not found");
    }

    #[tokio::test]
    async fn test_create_hashes_password_and_defaults_status() {
        let mut users = MockUserRepository::new();
        users
            .expect_create()
            .withf(|new_user| {
                new_user.status
                    && new_user.subject_id.is_none()
                    && new_user.password_hash != "SecurePassword123"
                    && Password::from_hash(new_user.password_hash.clone()).verify("SecurePassword123")
            })
            .returning(|_| Ok(stored_user(1)));
        let mut subjects = MockSubjectRepository::new();
        subjects.expect_exists().never();

        // subject_id 0 means "no subject"
        let user = manager(users, subjects)
            .create_user(create_input(Some(0)))
            .await
            .unwrap();

        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_short_password() {
        let mut users = MockUserRepository::new();
        users.expect_create().never();

        let mut input = create_input(None);
        input.password = "short".to_string();
        let result = manager(users, MockSubjectRepository::new())
            .create_user(input)
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_merges_onto_stored_record() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();
        users
            .expect_find_stored()
            .with(eq(1))
            .returning(|id| Ok(Some(stored_user(id))));
        users
            .expect_update()
            .withf(|user| {
                user.name == "noy" && user.email == "ton@example.com" && user.subject_id == Some(3)
            })
            .returning(|user| Ok(user));
        let mut subjects = MockSubjectRepository::new();
        subjects.expect_exists().with(eq(3)).returning(|_| Ok(true));

        let changes = UserChanges {
            name: Some("noy".to_string()),
            email: Some(String::new()),
            subject_id: Some(3),
            status: None,
        };
        let user = manager(users, subjects).update_user(1, changes).await.unwrap();

        assert_eq!(user.name, "noy");
        assert!(user.status);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_stored().returning(|_| Ok(None));
        users.expect_update().never();

        let result = manager(users, MockSubjectRepository::new())
            .update_user(5, UserChanges::default())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_with_missing_subject_writes_nothing() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_stored()
            .returning(|id| Ok(Some(stored_user(id))));
        users.expect_update().never();
        let mut subjects = MockSubjectRepository::new();
        subjects.expect_exists().returning(|_| Ok(false));

        let changes = UserChanges {
            subject_id: Some(8),
            ..Default::default()
        };
        let err = manager(users, subjects)
            .update_user(1, changes)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref what) if what == "subject with ID: 8"));
    }
}
