//! Subject CRUD handlers.

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, put},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::{EntityId, ValidatedJson};
use crate::api::AppState;
use crate::domain::{Subject, SubjectChanges};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse, NoContent};

/// Create subject request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubjectRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Mathematics")]
    pub name: String,
}

/// Partial update; omitted or empty fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSubjectRequest {
    #[schema(example = "Physics")]
    pub name: Option<String>,
    pub status: Option<bool>,
}

impl From<UpdateSubjectRequest> for SubjectChanges {
    fn from(req: UpdateSubjectRequest) -> Self {
        SubjectChanges {
            name: req.name,
            status: req.status,
        }
    }
}

/// Create subject routes
pub fn subject_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subjects).post(create_subject))
        .route("/clear-cache", delete(clear_subject_cache))
        .route("/:id", get(get_subject))
        .route("/update/:id", put(update_subject))
        .route("/delete/:id", delete(delete_subject))
}

/// List all subjects with their users
#[utoipa::path(
    get,
    path = "/api/v1/subjects",
    tag = "Subjects",
    responses((status = 200, description = "All subjects", body = [Subject]))
)]
pub async fn list_subjects(State(state): State<AppState>) -> AppResult<Json<Vec<Subject>>> {
    let subjects = state.subject_service.list_subjects().await?;
    Ok(Json(subjects))
}

/// Get subject by ID
#[utoipa::path(
    get,
    path = "/api/v1/subjects/{id}",
    tag = "Subjects",
    params(("id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject found", body = Subject),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn get_subject(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<Subject>> {
    let subject = state.subject_service.get_subject(id).await?;
    Ok(Json(subject))
}

/// Create a subject
#[utoipa::path(
    post,
    path = "/api/v1/subjects",
    tag = "Subjects",
    request_body = CreateSubjectRequest,
    responses(
        (status = 201, description = "Subject created", body = Subject),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_subject(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateSubjectRequest>,
) -> AppResult<Created<Subject>> {
    let subject = state.subject_service.create_subject(payload.name).await?;
    Ok(Created(subject))
}

/// Update a subject
#[utoipa::path(
    put,
    path = "/api/v1/subjects/update/{id}",
    tag = "Subjects",
    params(("id" = i32, Path, description = "Subject ID")),
    request_body = UpdateSubjectRequest,
    responses(
        (status = 200, description = "Subject updated", body = Subject),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn update_subject(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidatedJson(payload): ValidatedJson<UpdateSubjectRequest>,
) -> AppResult<Json<Subject>> {
    let subject = state
        .subject_service
        .update_subject(id, payload.into())
        .await?;
    Ok(Json(subject))
}

/// Delete a subject
#[utoipa::path(
    delete,
    path = "/api/v1/subjects/delete/{id}",
    tag = "Subjects",
    params(("id" = i32, Path, description = "Subject ID")),
    responses(
        (status = 204, description = "Subject deleted, its users detached"),
        (status = 404, description = "Subject not found")
    )
)]
pub async fn delete_subject(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<NoContent> {
    state.subject_service.delete_subject(id).await?;
    Ok(NoContent)
}

/// Drop every cached subject entry
#[utoipa::path(
    delete,
    path = "/api/v1/subjects/clear-cache",
    tag = "Subjects",
    responses(
        (status = 200, description = "Subject caches cleared", body = MessageResponse),
        (status = 500, description = "Cache unavailable")
    )
)]
pub async fn clear_subject_cache(
    State(state): State<AppState>,
) -> AppResult<Json<MessageResponse>> {
    state.subject_service.clear_cache().await?;
    Ok(Json(MessageResponse::new("Subject caches cleared successfully")))
}
