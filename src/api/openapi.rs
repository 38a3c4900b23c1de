//! OpenAPI documentation configuration.
//!
//! Served through Swagger UI at `/swagger-ui`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{auth_handler, subject_handler, user_handler};
use crate::domain::{Subject, User};
use crate::services::TokenPair;
use crate::types::{MessageResponse, PaginationMeta, UserList};

/// OpenAPI documentation for the subject roster API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Subject Roster API",
        version = "0.1.0",
        description = "Users and subjects CRUD with a cache-aside Redis layer and JWT login",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        auth_handler::login,
        auth_handler::refresh,
        auth_handler::me,
        user_handler::list_users,
        user_handler::get_user,
        user_handler::create_user,
        user_handler::update_user,
        user_handler::delete_user,
        user_handler::clear_user_cache,
        subject_handler::list_subjects,
        subject_handler::get_subject,
        subject_handler::create_subject,
        subject_handler::update_subject,
        subject_handler::delete_subject,
        subject_handler::clear_subject_cache,
    ),
    components(
        schemas(
            User,
            Subject,
            UserList,
            PaginationMeta,
            MessageResponse,
            TokenPair,
            auth_handler::LoginRequest,
            auth_handler::RefreshRequest,
            auth_handler::ProfileResponse,
            user_handler::CreateUserRequest,
            user_handler::UpdateUserRequest,
            subject_handler::CreateSubjectRequest,
            subject_handler::UpdateSubjectRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login, token refresh and profile"),
        (name = "Users", description = "User management operations"),
        (name = "Subjects", description = "Subject management operations")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token obtained from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
