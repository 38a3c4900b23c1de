//! Cache/store consistency through the real repositories.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use subject_roster::config::{CACHE_PREFIX_SUBJECTS, CACHE_PREFIX_USERS};
use subject_roster::domain::{NewUser, SubjectChanges, UserChanges, UserFilter};
use subject_roster::errors::{AppError, AppResult};
use subject_roster::infra::repositories::entities::{UserActiveModel, UserEntity};
use subject_roster::infra::{CacheAside, CacheStore, UserRepository, UserStore};
use subject_roster::services::ServiceContainer;

use common::setup;

/// Cache backend whose every call fails, as if Redis were unreachable.
struct UnreachableCache;

#[async_trait]
impl CacheStore for UnreachableCache {
    async fn get(&self, _: &str) -> AppResult<Option<Vec<u8>>> {
        Err(AppError::cache("connection refused"))
    }
    async fn set(&self, _: &str, _: &[u8], _: Duration) -> AppResult<()> {
        Err(AppError::cache("connection refused"))
    }
    async fn delete(&self, _: &str) -> AppResult<()> {
        Err(AppError::cache("connection refused"))
    }
    async fn delete_pattern(&self, _: &str) -> AppResult<u64> {
        Err(AppError::cache("connection refused"))
    }
    async fn ping(&self) -> AppResult<()> {
        Err(AppError::cache("connection refused"))
    }
}

/// Rename a user behind the repository's back.
async fn rename_in_store(db: &sea_orm::DatabaseConnection, id: i32, name: &str) {
    let model = UserEntity::find_by_id(id).one(db).await.unwrap().unwrap();
    let mut active: UserActiveModel = model.into();
    active.name = Set(name.to_string());
    active.update(db).await.unwrap();
}

#[tokio::test]
async fn test_cached_read_skips_store() {
    let app = setup().await;
    let user = app.create_user("ton", None).await;
    let users = app.services.users();

    let first = users.get_user(user.id).await.unwrap();
    assert!(app.cache.contains(&format!("users:{}", user.id)).await);

    rename_in_store(&app.db, user.id, "changed-directly").await;

    // Still served from cache
    let second = users.get_user(user.id).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(second.name, "ton");
}

#[tokio::test]
async fn test_update_invalidates_cached_entity() {
    let app = setup().await;
    let user = app.create_user("ton", None).await;
    let users = app.services.users();
    users.get_user(user.id).await.unwrap();

    let changes = UserChanges {
        name: Some("noy".to_string()),
        ..Default::default()
    };
    users.update_user(user.id, changes).await.unwrap();

    assert_eq!(users.get_user(user.id).await.unwrap().name, "noy");
}

#[tokio::test]
async fn test_update_merges_onto_store_not_cache() {
    let app = setup().await;
    let user = app.create_user("ton", None).await;
    let users = app.services.users();
    users.get_user(user.id).await.unwrap();

    rename_in_store(&app.db, user.id, "from-store").await;
    let changes = UserChanges {
        email: Some("new@example.com".to_string()),
        ..Default::default()
    };
    let updated = users.update_user(user.id, changes).await.unwrap();

    assert_eq!(updated.name, "from-store");
    assert_eq!(updated.email, "new@example.com");
}

#[tokio::test]
async fn test_delete_invalidates_cached_entity() {
    let app = setup().await;
    let user = app.create_user("ton", None).await;
    let users = app.services.users();
    users.get_user(user.id).await.unwrap();

    users.delete_user(user.id).await.unwrap();

    assert!(matches!(users.get_user(user.id).await, Err(AppError::NotFound(_))));
    assert!(matches!(users.delete_user(user.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_create_invalidates_cached_pages() {
    let app = setup().await;
    app.create_user("ton", None).await;
    let users = app.services.users();

    assert_eq!(users.list_users(UserFilter::default()).await.unwrap().meta.total, 1);

    app.create_user("noy", None).await;

    let page = users.list_users(UserFilter::default()).await.unwrap();
    assert_eq!(page.meta.total, 2);
    assert_eq!(page.data.len(), 2);
}

#[tokio::test]
async fn test_empty_update_leaves_record_unchanged() {
    let app = setup().await;
    let subject = app.create_subject("Mathematics").await;
    let user = app.create_user("ton", Some(subject.id)).await;

    let changes = UserChanges {
        name: Some(String::new()),
        email: Some(String::new()),
        subject_id: Some(0),
        status: None,
    };
    let updated = app.services.users().update_user(user.id, changes).await.unwrap();

    assert_eq!(updated.name, user.name);
    assert_eq!(updated.email, user.email);
    assert_eq!(updated.subject_id, Some(subject.id));
    assert_eq!(updated.status, user.status);
    assert!(updated.updated_at >= user.updated_at);
}

#[tokio::test]
async fn test_missing_subject_creates_no_user() {
    let app = setup().await;

    let result = app
        .services
        .users()
        .create_user(subject_roster::services::CreateUser {
            name: "ton".to_string(),
            email: "ton@example.com".to_string(),
            password: common::PASSWORD.to_string(),
            subject_id: Some(999),
            status: None,
        })
        .await;

    match result {
        Err(AppError::NotFound(what)) => assert_eq!(what, "subject with ID: 999"),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert_eq!(UserEntity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_first_page_holds_newest_users() {
    let app = setup().await;
    for name in ["u1", "u2", "u3", "u4", "u5"] {
        app.create_user(name, None).await;
    }

    let page = app
        .services
        .users()
        .list_users(UserFilter {
            page: 1,
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();

    let names: Vec<&str> = page.data.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["u5", "u4"]);
    assert_eq!(page.meta.total, 5);
    assert_eq!(page.meta.total_pages, 3);
}

#[tokio::test]
async fn test_clear_cache_only_touches_own_prefix() {
    let app = setup().await;
    let subject = app.create_subject("Mathematics").await;
    let user = app.create_user("ton", None).await;
    app.services.users().get_user(user.id).await.unwrap();
    app.services.users().list_users(UserFilter::default()).await.unwrap();
    app.services.subjects().get_subject(subject.id).await.unwrap();

    let removed = app.services.users().clear_cache().await.unwrap();

    assert_eq!(removed, 2);
    assert!(!app.cache.contains(&format!("users:{}", user.id)).await);
    assert!(app.cache.contains(&format!("subjects:{}", subject.id)).await);
}

#[tokio::test]
async fn test_subject_reads_see_new_members() {
    let app = setup().await;
    let subject = app.create_subject("Mathematics").await;
    let subjects = app.services.subjects();

    assert!(subjects.get_subject(subject.id).await.unwrap().users.is_empty());
    assert_eq!(subjects.list_subjects().await.unwrap().len(), 1);

    let user = app.create_user("ton", Some(subject.id)).await;

    let fetched = subjects.get_subject(subject.id).await.unwrap();
    assert_eq!(fetched.users.len(), 1);
    assert_eq!(fetched.users[0].id, user.id);
    assert_eq!(subjects.list_subjects().await.unwrap()[0].users.len(), 1);
}

#[tokio::test]
async fn test_subject_delete_detaches_cached_users() {
    let app = setup().await;
    let subject = app.create_subject("Mathematics").await;
    let user = app.create_user("ton", Some(subject.id)).await;
    let users = app.services.users();
    assert_eq!(users.get_user(user.id).await.unwrap().subject_id, Some(subject.id));

    app.services.subjects().delete_subject(subject.id).await.unwrap();

    assert_eq!(users.get_user(user.id).await.unwrap().subject_id, None);
    assert!(matches!(
        app.services.subjects().get_subject(subject.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_subject_update_is_partial() {
    let app = setup().await;
    let subject = app.create_subject("Mathematics").await;
    let subjects = app.services.subjects();
    subjects.get_subject(subject.id).await.unwrap();

    let updated = subjects
        .update_subject(
            subject.id,
            SubjectChanges {
                name: None,
                status: Some(false),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Mathematics");
    assert!(!updated.status);
    assert!(!subjects.get_subject(subject.id).await.unwrap().status);
}

#[tokio::test]
async fn test_user_store_works_while_cache_is_down() {
    let app = setup().await;
    let backend: Arc<dyn CacheStore> = Arc::new(UnreachableCache);
    let ttl = Duration::from_secs(60);
    let store = UserStore::new(
        app.db.clone(),
        CacheAside::new(backend.clone(), CACHE_PREFIX_USERS, ttl),
        CacheAside::new(backend, CACHE_PREFIX_SUBJECTS, ttl),
    );

    let created = store
        .create(NewUser {
            name: "ton".to_string(),
            email: "ton@example.com".to_string(),
            password_hash: "hash".to_string(),
            subject_id: None,
            status: true,
        })
        .await
        .unwrap();

    let mut renamed = store.find_by_id(created.id).await.unwrap().unwrap();
    renamed.name = "noy".to_string();
    store.update(renamed).await.unwrap();

    assert_eq!(store.find_by_id(created.id).await.unwrap().unwrap().name, "noy");
    assert_eq!(store.list(&UserFilter::default()).await.unwrap().meta.total, 1);

    store.delete(created.id).await.unwrap();
    assert!(store.find_by_id(created.id).await.unwrap().is_none());

    assert!(matches!(store.clear_cache().await, Err(AppError::Cache(_))));
}

#[tokio::test]
async fn test_subject_update_keeps_cached_user_pages() {
    let app = setup().await;
    let subject = app.create_subject("Mathematics").await;
    app.create_user("ton", Some(subject.id)).await;
    app.services.users().list_users(UserFilter::default()).await.unwrap();

    app.services
        .subjects()
        .update_subject(
            subject.id,
            SubjectChanges {
                name: Some("Physics".to_string()),
                status: None,
            },
        )
        .await
        .unwrap();

    assert!(
        app.cache
            .contains("users:all_page1_limit10_name_start_end")
            .await
    );
}
