//! User domain entity and related types.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, FILTER_DATE_FORMAT, MAX_PAGE_SIZE};

/// User domain entity.
///
/// This is the record served to clients and stored in the cache. The password
/// hash only travels inside [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "ton")]
    pub name: String,
    #[schema(example = "ton@example.com")]
    pub email: String,
    /// Subject this user is attached to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 1)]
    pub subject_id: Option<i32>,
    /// Active (`true`) or inactive (`false`)
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login material for a user, loaded from the store only.
#[derive(Clone)]
pub struct UserCredentials {
    pub id: i32,
    pub name: String,
    pub password_hash: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Data needed to insert a user. The password is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub subject_id: Option<i32>,
    pub status: bool,
}

/// Partial update payload.
///
/// Absent fields, empty strings and a `subject_id` of `0` all mean
/// "leave unchanged". `status` is applied whenever it is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject_id: Option<i32>,
    pub status: Option<bool>,
}

impl UserChanges {
    /// Subject the update wants to attach, ignoring the zero sentinel.
    pub fn subject_reference(&self) -> Option<i32> {
        self.subject_id.filter(|id| *id != 0)
    }

    /// Merge these changes into an existing user.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = self.name.as_ref().filter(|n| !n.is_empty()) {
            user.name = name.clone();
        }
        if let Some(email) = self.email.as_ref().filter(|e| !e.is_empty()) {
            user.email = email.clone();
        }
        if let Some(subject_id) = self.subject_reference() {
            user.subject_id = Some(subject_id);
        }
        if let Some(status) = self.status {
            user.status = status;
        }
        user.updated_at = Utc::now();
    }
}

/// Filters and pagination for listing users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFilter {
    pub page: u64,
    pub limit: u64,
    /// Case-sensitive substring match on the name
    pub name: Option<String>,
    /// Inclusive lower bound on the creation day (UTC)
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the creation day (UTC)
    pub end_date: Option<NaiveDate>,
}

impl Default for UserFilter {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            limit: DEFAULT_PAGE_SIZE,
            name: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl UserFilter {
    /// Rows to skip for the requested page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit())
    }

    /// Page size capped at the maximum.
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Name filter, treating an empty string as absent.
    pub fn name_filter(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// First instant included by `start_date`.
    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.start_date.and_then(day_start)
    }

    /// First instant excluded by `end_date` (midnight of the following day).
    pub fn created_before(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|date| date.succ_opt())
            .and_then(day_start)
    }

    /// Deterministic signature of every filter parameter.
    ///
    /// Two filters produce the same signature only if they select the same page.
    pub fn signature(&self) -> String {
        format!(
            "page{}_limit{}_name{}_start{}_end{}",
            self.page,
            self.limit(),
            self.name_filter().unwrap_or_default(),
            format_day(self.start_date),
            format_day(self.end_date),
        )
    }
}

fn day_start(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn format_day(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(FILTER_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let created = Utc.with_ymd_and_hms(2025, 3, 10, 4, 40, 50).unwrap();
        User {
            id: 1,
            name: "ton".to_string(),
            email: "ton@example.com".to_string(),
            subject_id: Some(2),
            status: true,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_empty_changes_only_touch_updated_at() {
        let original = sample_user();
        let mut user = original.clone();

        let changes = UserChanges {
            name: Some(String::new()),
            email: Some(String::new()),
            subject_id: Some(0),
            status: None,
        };
        changes.apply_to(&mut user);

        assert_eq!(user.name, original.name);
        assert_eq!(user.email, original.email);
        assert_eq!(user.subject_id, original.subject_id);
        assert_eq!(user.status, original.status);
        assert!(user.updated_at > original.updated_at);
    }

    #[test]
    fn test_changes_applied() {
        let mut user = sample_user();
        UserChanges {
            name: Some("noy".to_string()),
            email: None,
            subject_id: Some(5),
            status: Some(false),
        }
        .apply_to(&mut user);

        assert_eq!(user.name, "noy");
        assert_eq!(user.email, "ton@example.com");
        assert_eq!(user.subject_id, Some(5));
        assert!(!user.status);
    }

    #[test]
    fn test_subject_reference_ignores_zero() {
        let changes = UserChanges {
            subject_id: Some(0),
            ..Default::default()
        };
        assert_eq!(changes.subject_reference(), None);
    }

    #[test]
    fn test_filter_offset_and_limit() {
        let filter = UserFilter {
            page: 3,
            limit: 500,
            ..Default::default()
        };
        assert_eq!(filter.limit(), MAX_PAGE_SIZE);
        assert_eq!(filter.offset(), 2 * MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        let filter = UserFilter {
            page: u64::MAX,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(filter.offset(), u64::MAX);
    }

    #[test]
    fn test_filter_day_bounds() {
        let filter = UserFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31),
            ..Default::default()
        };
        assert_eq!(
            filter.created_from(),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            filter.created_before(),
            Some(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_signature_distinguishes_filters() {
        let base = UserFilter::default();
        let named = UserFilter {
            name: Some("ton".to_string()),
            ..Default::default()
        };
        let dated = UserFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 2),
            ..Default::default()
        };

        assert_eq!(base.signature(), "page1_limit10_name_start_end");
        assert_eq!(named.signature(), "page1_limit10_nameton_start_end");
        assert_eq!(dated.signature(), "page1_limit10_name_start2025-01-02_end");
    }
}
