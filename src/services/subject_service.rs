//! Subject service - Handles subject-related business logic.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{Subject, SubjectChanges};
use crate::errors::{AppResult, OptionExt};
use crate::infra::SubjectRepository;

/// Subject service trait for dependency injection.
#[async_trait]
pub trait SubjectService: Send + Sync {
    async fn get_subject(&self, id: i32) -> AppResult<Subject>;

    async fn list_subjects(&self) -> AppResult<Vec<Subject>>;

    async fn create_subject(&self, name: String) -> AppResult<Subject>;

    /// Apply a partial update
    async fn update_subject(&self, id: i32, changes: SubjectChanges) -> AppResult<Subject>;

    /// Delete a subject; its users keep existing without a subject
    async fn delete_subject(&self, id: i32) -> AppResult<()>;

    /// Drop every cached subject entry
    async fn clear_cache(&self) -> AppResult<u64>;
}

/// Concrete implementation of SubjectService.
pub struct SubjectManager {
    subjects: Arc<dyn SubjectRepository>,
}

impl SubjectManager {
    pub fn new(subjects: Arc<dyn SubjectRepository>) -> Self {
        Self { subjects }
    }
}

#[async_trait]
impl SubjectService for SubjectManager {
    async fn get_subject(&self, id: i32) -> AppResult<Subject> {
        self.subjects.find_by_id(id).await?.ok_or_not_found("Subject")
    }

    async fn list_subjects(&self) -> AppResult<Vec<Subject>> {
        self.subjects.list().await
    }

    async fn create_subject(&self, name: String) -> AppResult<Subject> {
        self.subjects.create(name).await
    }

    async fn update_subject(&self, id: i32, changes: SubjectChanges) -> AppResult<Subject> {
        let mut subject = self
            .subjects
            .find_stored(id)
            .await?
            .ok_or_not_found("Subject")?;

        changes.apply_to(&mut subject);
        self.subjects.update(subject).await
    }

    async fn delete_subject(&self, id: i32) -> AppResult<()> {
        self.subjects.delete(id).await
    }

    async fn clear_cache(&self) -> AppResult<u64> {
        self.subjects.clear_cache().await
    }
}
