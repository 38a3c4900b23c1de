//! Serve command - Starts the HTTP server.

use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::{CacheBackend, Config};
use crate::errors::{AppError, AppResult};
use crate::infra::{CacheStore, Database, MemoryCache, RedisCache};

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    if let Some(host) = args.host {
        config.server_host = host;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }

    let db = Arc::new(Database::connect(&config).await?);
    let cache = connect_cache(&config).await?;

    let app_state = AppState::from_config(db, cache, config.clone());
    let app = create_router(app_state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}

/// Build the single cache handle shared by every repository.
async fn connect_cache(config: &Config) -> AppResult<Arc<dyn CacheStore>> {
    match config.cache_backend {
        CacheBackend::Redis => Ok(Arc::new(RedisCache::connect(&config.redis_url).await?)),
        CacheBackend::Memory => {
            tracing::warn!("Using in-process memory cache; entries are not shared between instances");
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}
