//! Subject domain entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::User;

/// A subject that users can be attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Subject {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Mathematics")]
    pub name: String,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Users referencing this subject; only filled by reads that fetch the relation
    #[serde(default)]
    pub users: Vec<User>,
}

/// Partial update payload for a subject.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectChanges {
    pub name: Option<String>,
    pub status: Option<bool>,
}

impl SubjectChanges {
    /// Merge these changes into an existing subject.
    pub fn apply_to(&self, subject: &mut Subject) {
        if let Some(name) = self.name.as_ref().filter(|n| !n.is_empty()) {
            subject.name = name.clone();
        }
        if let Some(status) = self.status {
            subject.status = status;
        }
        subject.updated_at = Utc::now();
    }
}
