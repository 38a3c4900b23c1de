//! Shared harness: SQLite in-memory store, in-process cache, real services.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;

use subject_roster::api::{create_router, AppState};
use subject_roster::config::Config;
use subject_roster::domain::{Subject, User};
use subject_roster::infra::{Database, MemoryCache};
use subject_roster::services::{CreateUser, ServiceContainer, Services};

pub const ACCESS_SECRET: &str = "integration-access-secret-32-chars-min";
pub const REFRESH_SECRET: &str = "integration-refresh-secret-32-chars-min";
pub const PASSWORD: &str = "SecurePassword123";

pub struct TestApp {
    pub services: Services,
    pub cache: MemoryCache,
    pub db: DatabaseConnection,
    pub router: Router,
}

pub async fn setup() -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let connection = SeaDatabase::connect(options)
        .await
        .expect("sqlite connection");

    let database = Database::from_connection(connection);
    database.run_migrations().await.expect("migrations");

    let cache = MemoryCache::new();
    let config = Config::with_secrets(ACCESS_SECRET, REFRESH_SECRET).expect("config");
    let services = Services::from_parts(
        database.connection().clone(),
        Arc::new(cache.clone()),
        config,
    );
    let state = AppState::from_container(&services, Arc::new(cache.clone()), Arc::new(database.clone()));

    TestApp {
        services,
        cache,
        db: database.connection().clone(),
        router: create_router(state),
    }
}

impl TestApp {
    pub async fn create_subject(&self, name: &str) -> Subject {
        self.services
            .subjects()
            .create_subject(name.to_string())
            .await
            .expect("create subject")
    }

    pub async fn create_user(&self, name: &str, subject_id: Option<i32>) -> User {
        self.services
            .users()
            .create_user(CreateUser {
                name: name.to_string(),
                email: format!("{}@example.com", name),
                password: PASSWORD.to_string(),
                subject_id,
                status: None,
            })
            .await
            .expect("create user")
    }

    /// Send a request through the router, returning status and JSON body
    /// (`Null` for empty bodies).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }
}
