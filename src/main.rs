use std::net::SocketAddr;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hix_backend_core::{
    app_config::AppConfig, build_router, build_store, db::mask_connection_string,
    initialize_app_state, AppState, StoreBackend,
};

const USAGE: &str = "usage: hix-backend-core [create-user <email> <name>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hix_backend_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();
    let config = AppConfig::from_env().context("Invalid configuration")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => serve(config).await,
        Some("create-user") => create_user(config, &args[1..]).await,
        Some(other) => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!(
        "Starting hix.io backend on {} ({} environment, {:?} store)",
        config.bind_address, config.environment, config.store_backend
    );
    if config.store_backend == StoreBackend::Postgres {
        info!("Database URL: {}", mask_connection_string(&config.database_url));
    }

    let bind_address = config.bind_address.clone();
    let state = initialize_app_state(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize application: {}", e))?;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on {}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// `create-user <email> <name>`, password from HIX_USER_PASSWORD
async fn create_user(config: AppConfig, args: &[String]) -> anyhow::Result<()> {
    let (email, name) = match args {
        [email, name, ..] => (email.as_str(), name.as_str()),
        _ => bail!(USAGE),
    };
    let password = std::env::var("HIX_USER_PASSWORD")
        .context("HIX_USER_PASSWORD must hold the new user's password")?;

    let store = build_store(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
    let state = AppState::new(config, store);

    let user = state.credentials.create(email, &password, Some(name)).await?;
    info!("Created user {} ({})", user.email, user.name);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
