//! User CRUD handlers.

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, put},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidateEmail, ValidationError};

use crate::api::extractors::{EntityId, ValidatedJson, ValidatedQuery};
use crate::api::AppState;
use crate::config::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, FILTER_DATE_FORMAT, MAX_PAGE_NUMBER};
use crate::domain::{User, UserChanges, UserFilter};
use crate::errors::{AppError, AppResult};
use crate::services::CreateUser;
use crate::types::{Created, MessageResponse, NoContent, Paginated, UserList};

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Page number, starting at 1
    #[validate(range(min = 1, message = "page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: Option<u64>,
    /// Page size
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    #[param(minimum = 1, maximum = 100, example = 10)]
    pub limit: Option<u64>,
    /// Substring the name must contain
    pub name: Option<String>,
    /// Earliest creation day, `YYYY-MM-DD`
    #[serde(rename = "startDate")]
    #[param(example = "2025-03-01")]
    pub start_date: Option<String>,
    /// Latest creation day (inclusive), `YYYY-MM-DD`
    #[serde(rename = "endDate")]
    #[param(example = "2025-03-31")]
    pub end_date: Option<String>,
}

impl UserListQuery {
    /// Convert to a domain filter, rejecting malformed dates.
    pub fn into_filter(self) -> AppResult<UserFilter> {
        let page = self.page.unwrap_or(DEFAULT_PAGE_NUMBER);
        if page > MAX_PAGE_NUMBER {
            return Err(AppError::BadRequest(format!(
                "page must be at most {}",
                MAX_PAGE_NUMBER
            )));
        }

        Ok(UserFilter {
            page,
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            name: self.name.filter(|n| !n.is_empty()),
            start_date: parse_day("startDate", self.start_date)?,
            end_date: parse_day("endDate", self.end_date)?,
        })
    }
}

fn parse_day(field: &str, raw: Option<String>) -> AppResult<Option<NaiveDate>> {
    match raw.as_deref().filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, FILTER_DATE_FORMAT)
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{} must be YYYY-MM-DD, got '{}'", field, s))),
    }
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "ton")]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ton@example.com")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
    /// Subject to attach; `0` or absent means none
    #[schema(example = 1)]
    pub subject_id: Option<i32>,
    /// Defaults to active
    pub status: Option<bool>,
}

/// Partial update; omitted or empty fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "noy")]
    pub name: Option<String>,
    #[validate(custom(function = "blank_or_email"))]
    #[schema(example = "noy@example.com")]
    pub email: Option<String>,
    /// `0` leaves the current subject in place
    pub subject_id: Option<i32>,
    pub status: Option<bool>,
}

fn blank_or_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.validate_email() {
        Ok(())
    } else {
        let mut error = ValidationError::new("email");
        error.message = Some("Invalid email format".into());
        Err(error)
    }
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        UserChanges {
            name: req.name,
            email: req.email,
            subject_id: req.subject_id,
            status: req.status,
        }
    }
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/clear-cache", delete(clear_user_cache))
        .route("/:id", get(get_user))
        .route("/update/:id", put(update_user))
        .route("/delete/:id", delete(delete_user))
}

/// List users with filters and pagination
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(UserListQuery),
    responses(
        (status = 200, description = "One page of users, newest first", body = UserList),
        (status = 400, description = "Invalid query parameters")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<UserListQuery>,
) -> AppResult<Json<Paginated<User>>> {
    let page = state.user_service.list_users(query.into_filter()?).await?;
    Ok(Json(page))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<User>> {
    let user = state.user_service.get_user(id).await?;
    Ok(Json(user))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Referenced subject not found")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<Created<User>> {
    let user = state
        .user_service
        .create_user(CreateUser {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            subject_id: payload.subject_id,
            status: payload.status,
        })
        .await?;

    Ok(Created(user))
}

/// Update a user
#[utoipa::path(
    put,
    path = "/api/v1/users/update/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Validation error"),
        (status = 404, description = "User or referenced subject not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    let user = state.user_service.update_user(id, payload.into()).await?;
    Ok(Json(user))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/delete/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<NoContent> {
    state.user_service.delete_user(id).await?;
    Ok(NoContent)
}

/// Drop every cached user entry
#[utoipa::path(
    delete,
    path = "/api/v1/users/clear-cache",
    tag = "Users",
    responses(
        (status = 200, description = "User caches cleared", body = MessageResponse),
        (status = 500, description = "Cache unavailable")
    )
)]
pub async fn clear_user_cache(State(state): State<AppState>) -> AppResult<Json<MessageResponse>> {
    state.user_service.clear_cache().await?;
    Ok(Json(MessageResponse::new("User caches cleared successfully")))
}
