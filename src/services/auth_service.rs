//! Authentication service - Login, token refresh and token verification.
//!
//! Access and refresh tokens are both HS256 JWTs signed with separate
//! secrets. The `token_type` claim keeps one from being used as the other.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::Config;
use crate::domain::{Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// Which of the two tokens a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub name: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

/// Token pair returned after successful authentication
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    /// Short-lived token for the `Authorization: Bearer` header
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Long-lived token accepted by `/auth/refresh`
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Check name and password, issue a token pair
    async fn login(&self, name: &str, password: &str) -> AppResult<TokenPair>;

    /// Exchange a valid refresh token for a new pair
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;

    /// Verify an access token and extract its claims
    fn verify_access_token(&self, token: &str) -> AppResult<Claims>;

    /// Current profile of the user a token was issued to
    async fn profile(&self, user_id: i32) -> AppResult<User>;
}

/// Concrete implementation of AuthService.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    config: Config,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserRepository>, config: Config) -> Self {
        Self { users, config }
    }

    fn secret(&self, token_type: TokenType) -> &[u8] {
        match token_type {
            TokenType::Access => self.config.jwt_secret_bytes(),
            TokenType::Refresh => self.config.jwt_refresh_secret_bytes(),
        }
    }

    fn sign(&self, user_id: i32, name: &str, token_type: TokenType) -> AppResult<String> {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => Duration::minutes(self.config.jwt_expiration_minutes),
            TokenType::Refresh => Duration::hours(self.config.jwt_refresh_expiration_hours),
        };

        let claims = Claims {
            user_id,
            name: name.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(token_type)),
        )?;
        Ok(token)
    }

    fn issue_pair(&self, user_id: i32, name: &str) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign(user_id, name, TokenType::Access)?,
            refresh_token: self.sign(user_id, name, TokenType::Refresh)?,
        })
    }

    fn verify(&self, token: &str, expected: TokenType) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(expected)),
            &Validation::default(),
        )?;

        if token_data.claims.token_type != expected {
            tracing::debug!(?expected, "Token type mismatch");
            return Err(AppError::Unauthorized);
        }
        Ok(token_data.claims)
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn login(&self, name: &str, password: &str) -> AppResult<TokenPair> {
        let credentials = self.users.find_credentials(name).await?;

        // Unknown names still pay for one hash verification
        let stored = credentials
            .as_ref()
            .map(|c| Password::from_hash(c.password_hash.clone()))
            .unwrap_or_else(Password::decoy);
        let password_valid = stored.verify(password);

        match credentials {
            Some(user) if password_valid => {
                tracing::info!(user_id = user.id, "User logged in");
                self.issue_pair(user.id, &user.name)
            }
            _ => {
                tracing::debug!(name = %name, "Login rejected");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self.verify(refresh_token, TokenType::Refresh)?;

        // The account may have been removed since the token was issued
        let user = self
            .users
            .find_stored(claims.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        self.issue_pair(user.id, &user.name)
    }

    fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        self.verify(token, TokenType::Access)
    }

    async fn profile(&self, user_id: i32) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}
