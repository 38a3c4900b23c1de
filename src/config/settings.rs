//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::constants::{
    DEFAULT_CACHE_TTL_SECONDS, DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_DATABASE_URL,
    DEFAULT_JWT_EXPIRATION_MINUTES, DEFAULT_JWT_REFRESH_EXPIRATION_HOURS, DEFAULT_REDIS_URL,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, DEV_JWT_REFRESH_SECRET, DEV_JWT_SECRET,
    MIN_JWT_SECRET_LENGTH,
};
use crate::errors::{AppError, AppResult};

/// Which cache backend the process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(AppError::validation(format!(
                "Unknown CACHE_BACKEND '{}', expected 'redis' or 'memory'",
                other
            ))),
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub cache_backend: CacheBackend,
    pub cache_ttl_seconds: u64,
    jwt_secret: String,
    jwt_refresh_secret: String,
    pub jwt_expiration_minutes: i64,
    pub jwt_refresh_expiration_hours: i64,
    pub server_host: String,
    pub server_port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("database_max_connections", &self.database_max_connections)
            .field("redis_url", &"[REDACTED]")
            .field("cache_backend", &self.cache_backend)
            .field("cache_ttl_seconds", &self.cache_ttl_seconds)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_refresh_secret", &"[REDACTED]")
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("jwt_refresh_expiration_hours", &self.jwt_refresh_expiration_hours)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .finish()
    }
}

impl Config {
    /// Build a configuration with default settings and the given signing secrets.
    ///
    /// # Errors
    /// Returns a validation error if either secret is shorter than
    /// `MIN_JWT_SECRET_LENGTH`.
    pub fn with_secrets(
        jwt_secret: impl Into<String>,
        jwt_refresh_secret: impl Into<String>,
    ) -> AppResult<Self> {
        let jwt_secret = jwt_secret.into();
        let jwt_refresh_secret = jwt_refresh_secret.into();
        check_secret("JWT_SECRET", &jwt_secret)?;
        check_secret("JWT_REFRESH_SECRET", &jwt_refresh_secret)?;

        Ok(Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            cache_backend: CacheBackend::Redis,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            jwt_secret,
            jwt_refresh_secret,
            jwt_expiration_minutes: DEFAULT_JWT_EXPIRATION_MINUTES,
            jwt_refresh_expiration_hours: DEFAULT_JWT_REFRESH_EXPIRATION_HOURS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
        })
    }

    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// Signing secrets fall back to insecure defaults in debug builds only.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = secret_from_env("JWT_SECRET", DEV_JWT_SECRET)?;
        let jwt_refresh_secret = secret_from_env("JWT_REFRESH_SECRET", DEV_JWT_REFRESH_SECRET)?;
        let mut config = Self::with_secrets(jwt_secret, jwt_refresh_secret)?;

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(url) = env::var("REDIS_URL") {
            config.redis_url = url;
        }
        if let Ok(backend) = env::var("CACHE_BACKEND") {
            config.cache_backend = backend.parse()?;
        }
        if let Ok(host) = env::var("SERVER_HOST") {
            config.server_host = host;
        }
        config.database_max_connections =
            parsed_env("DATABASE_MAX_CONNECTIONS", config.database_max_connections);
        config.cache_ttl_seconds = parsed_env("CACHE_TTL_SECONDS", config.cache_ttl_seconds);
        config.jwt_expiration_minutes =
            parsed_env("JWT_EXPIRATION_MINUTES", config.jwt_expiration_minutes);
        config.jwt_refresh_expiration_hours = parsed_env(
            "JWT_REFRESH_EXPIRATION_HOURS",
            config.jwt_refresh_expiration_hours,
        );
        config.server_port = parsed_env("SERVER_PORT", config.server_port);

        Ok(config)
    }

    /// Access token signing secret.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Refresh token signing secret.
    pub fn jwt_refresh_secret_bytes(&self) -> &[u8] {
        self.jwt_refresh_secret.as_bytes()
    }

    /// TTL applied to every cache entry.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn check_secret(name: &str, secret: &str) -> AppResult<()> {
    if secret.len() < MIN_JWT_SECRET_LENGTH {
        return Err(AppError::validation(format!(
            "{} must be at least {} characters long",
            name, MIN_JWT_SECRET_LENGTH
        )));
    }
    Ok(())
}

fn secret_from_env(name: &str, dev_default: &str) -> AppResult<String> {
    match env::var(name) {
        Ok(secret) => Ok(secret),
        Err(_) if cfg!(debug_assertions) => {
            tracing::warn!("{} not set, using insecure default for development", name);
            Ok(dev_default.to_string())
        }
        Err(_) => Err(AppError::validation(format!(
            "{} environment variable must be set in production",
            name
        ))),
    }
}

fn parsed_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
