//! Paginated list envelope.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::User;

/// One page of results plus its metadata.
///
/// Also the cached representation of a user list page, hence `Deserialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[aliases(UserList = Paginated<User>)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    /// Rows matching the filters across all pages
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit > 0 { total.div_ceil(limit) } else { 0 };

        Self {
            data,
            meta: PaginationMeta {
                page,
                limit,
                total,
                total_pages,
            },
        }
    }
}
