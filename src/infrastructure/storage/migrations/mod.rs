//! Database migrations

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// Table names used by the storage layer
pub mod tables {
    pub const CONTENT_ITEMS: &str = "content_items";
    pub const COMMENTS: &str = "comments";
    pub const API_KEYS: &str = "api_keys";
    pub const SITE_SETTINGS: &str = "site_settings";
}

/// Applies versioned migrations, recording them in `_migrations`
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    /// Apply one migration unless already recorded; returns true if it ran
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
                .bind(migration.version)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to check migration status: {}", e))
                })?;

        if applied {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to start transaction: {}", e)))?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        Ok(true)
    }

    /// Latest applied version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// A versioned schema change
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub up: &'static str,
}

const fn entity_table(version: i64, description: &'static str, up: &'static str) -> Migration {
    Migration {
        version,
        description,
        up,
    }
}

/// Ordered migrations for the storage layer
pub fn storage_migrations() -> Vec<Migration> {
    vec![
        entity_table(
            1,
            "Create content_items table",
            r#"
            CREATE TABLE IF NOT EXISTS content_items (
                key VARCHAR(64) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_content_items_slug
                ON content_items ((data->>'slug'));
            CREATE INDEX IF NOT EXISTS idx_content_items_status
                ON content_items ((data->>'status'));
            "#,
        ),
        entity_table(
            2,
            "Create comments table",
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                key VARCHAR(64) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_comments_content
                ON comments ((data->>'contentId'), created_at);
            "#,
        ),
        entity_table(
            3,
            "Create api_keys table",
            r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                key VARCHAR(64) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_api_keys_secret_hash
                ON api_keys ((data->>'secretHash'));
            "#,
        ),
        entity_table(
            4,
            "Create site_settings table",
            r#"
            CREATE TABLE IF NOT EXISTS site_settings (
                key VARCHAR(64) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        ),
        entity_table(
            5,
            "Index comments by moderation status",
            r#"
            CREATE INDEX IF NOT EXISTS idx_comments_status
                ON comments ((data->>'status'));
            "#,
        ),
    ]
}

/// Run all pending storage migrations
pub async fn run_storage_migrations(pool: &PgPool) -> Result<(), DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());
    migrator.ensure_migrations_table().await?;

    for migration in storage_migrations() {
        if migrator.run_migration(&migration).await? {
            info!(
                version = migration.version,
                description = migration.description,
                "Applied migration"
            );
        }
    }

    Ok(())
}
