// Embedded schema migrations
// Shipped inside the binary so deployments need no migration tooling

pub mod diesel;

use crate::app_config::AppConfig;
use std::error::Error;
use tracing::{error, info};

/// Run pending migrations unless disabled in config
pub async fn run_all_migrations(config: &AppConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    if !should_run_migrations(config) {
        info!("[MIGRATIONS] Skipping embedded migrations (disabled in config)");
        return Ok(());
    }

    info!(
        "[MIGRATIONS] Starting migration process for environment: {}",
        config.environment
    );

    match diesel::run_migrations(&config.database_url).await {
        Ok(0) => info!("[MIGRATIONS] ✓ Diesel migrations up to date"),
        Ok(applied_count) => info!("[MIGRATIONS] ✓ Applied {} Diesel migrations", applied_count),
        Err(e) => {
            error!("[MIGRATIONS] ✗ Diesel migration failed: {}", e);
            return Err(format!("Diesel migration failed: {}", e).into());
        },
    }

    Ok(())
}

pub fn should_run_migrations(config: &AppConfig) -> bool {
    !config.disable_embedded_migrations
}
