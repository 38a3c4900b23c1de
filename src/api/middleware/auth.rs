//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::errors::AppError;

/// Authenticated user extracted from the access token
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i32,
    pub name: String,
}

/// JWT authentication middleware.
///
/// Validates the bearer access token (signature, expiry, token type) and
/// injects the CurrentUser into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let token = auth_header
        .strip_prefix(BEARER_TOKEN_PREFIX)
        .ok_or(AppError::Unauthorized)?;

    let claims = state.auth_service.verify_access_token(token)?;

    request.extensions_mut().insert(CurrentUser {
        id: claims.user_id,
        name: claims.name,
    });

    Ok(next.run(request).await)
}
