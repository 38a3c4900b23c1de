//! Numeric `:id` path segment.

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::errors::AppError;

/// Positive integer id taken from the route's single path parameter.
///
/// Anything else (`abc`, `-1`, `0`) is a 400 instead of axum's plain-text
/// rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        match raw.parse::<i32>() {
            Ok(id) if id > 0 => Ok(EntityId(id)),
            _ => Err(AppError::BadRequest(format!("invalid id '{}'", raw))),
        }
    }
}
