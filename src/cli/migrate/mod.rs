//! Migrate command - prepares the Postgres schema without serving

use tracing::{info, warn};

use crate::config::{AppConfig, StorageKind};
use crate::infrastructure::logging;
use crate::infrastructure::storage::PostgresMigrator;

/// Apply storage migrations for the configured database
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging)?;

    if config.storage.backend != StorageKind::Postgres {
        warn!("Storage backend is in-memory; nothing to migrate");
        return Ok(());
    }

    let backend = crate::create_storage_backend(&config).await?;
    if let Some(pool) = backend.pool() {
        let version = PostgresMigrator::new(pool.clone()).current_version().await?;
        info!(version = ?version, "Storage migrations applied");
    }

    Ok(())
}
