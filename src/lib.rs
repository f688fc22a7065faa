// Library exports for the hix.io backend
// Exposes the router and state builders so the binary and integration tests share them

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod store;
pub mod utils;

use axum::{routing::get, Router};
use std::error::Error;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, ConfigError, Environment, StoreBackend};
pub use db::DieselPool;
pub use services::{
    AuthGuard, AuthorizationPolicy, CredentialService, LinkShortener, PostService,
};
pub use store::{MemoryStore, Store, StoreError};
pub use utils::service_error::ServiceError;

/// Build the store bundle for the configured backend, running migrations first
pub async fn build_store(config: &AppConfig) -> Result<Store, Box<dyn Error + Send + Sync>> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Ok(Store::memory())
        },
        StoreBackend::Postgres => {
            migrations::run_all_migrations(config).await?;

            info!("Initializing database pool...");
            let pool = db::create_diesel_pool(db::DieselDatabaseConfig::from(config)).await?;
            Ok(Store::postgres(pool))
        },
    }
}

/// Store, services and startup housekeeping in one call
pub async fn initialize_app_state(
    config: AppConfig,
) -> Result<AppState, Box<dyn Error + Send + Sync>> {
    let store = build_store(&config).await?;
    let state = AppState::new(config, store);

    state.credentials.prepare_decoy().await?;

    let purged = state.auth_guard.purge_expired_sessions().await;
    info!("Startup: purged {} expired sessions", purged);

    Ok(state)
}

async fn not_found() -> ServiceError {
    ServiceError::NotFound
}

/// Full application router. Serve it with connect info so request origins resolve.
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(handlers::auth_routes())
        .merge(handlers::url_routes())
        .merge(handlers::post_routes())
        .route("/{short}", get(handlers::redirect::follow))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(middleware::cors_layer(&config))
        .with_state(state)
}
