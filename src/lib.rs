//! Content Gateway
//!
//! Serves paywalled articles and public comments for a content site:
//! - Paywall-aware splitting of article bodies into free previews
//! - API key issuance, authentication and usage metering
//! - Per-client throttling and idempotent comment submission
//! - Human verification and moderation of public comments

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::middleware::AdminCredentials;
use api::state::AppState;
use config::{CacheKind, StorageKind};
use domain::{ApiKey, Comment, ContentItem, HumanVerifier, SiteSettings};
use infrastructure::{
    access::{AccessOrchestrator, AccessOrchestratorDeps},
    api_key::{ApiKeyGenerator, ApiKeyService, StorageApiKeyRepository, UsageRecorder},
    cache::{CacheBackend, CacheFactory, RedisCacheConfig},
    comment::StorageCommentRepository,
    content::StorageContentRepository,
    idempotency::IdempotencyCache,
    rate_limit::{RateLimitPolicy, RateLimiter},
    settings::StorageSettingsRepository,
    storage::{
        migrations::tables, run_storage_migrations, PostgresConfig, StorageBackend,
        StorageFactory,
    },
    verification::{BypassVerifier, TurnstileVerifier},
};
use tracing::{info, warn};

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_backend = create_storage_backend(config).await?;

    let content = Arc::new(StorageContentRepository::new(
        StorageFactory::create::<ContentItem>(&storage_backend, tables::CONTENT_ITEMS),
    ));
    let comments = Arc::new(StorageCommentRepository::new(
        StorageFactory::create::<Comment>(&storage_backend, tables::COMMENTS),
    ));
    let settings = Arc::new(StorageSettingsRepository::new(
        StorageFactory::create::<SiteSettings>(&storage_backend, tables::SITE_SETTINGS),
    ));
    let api_key_repository = Arc::new(StorageApiKeyRepository::new(
        StorageFactory::create::<ApiKey>(&storage_backend, tables::API_KEYS),
    ));

    let cache = CacheFactory::create(&cache_backend(config)?).await?;
    let operation_timeout = Duration::from_millis(config.cache.operation_timeout_ms);

    let api_key_service = ApiKeyService::new(
        api_key_repository.clone(),
        ApiKeyGenerator::new(config.api_keys.prefix.clone()),
        UsageRecorder::spawn(api_key_repository, config.api_keys.usage_queue_capacity),
    );

    let rate_limiter = RateLimiter::new(
        cache.clone(),
        operation_timeout,
        config.rate_limit.failure_policy,
    );
    let idempotency = IdempotencyCache::new(
        cache.clone(),
        Duration::from_secs(config.idempotency.retention_secs),
        Duration::from_secs(config.idempotency.reservation_ttl_secs),
        operation_timeout,
    );

    let orchestrator = AccessOrchestrator::new(AccessOrchestratorDeps {
        content,
        comments: comments.clone(),
        settings: settings.clone(),
        api_keys: api_key_service.clone(),
        rate_limiter,
        idempotency,
        verifier: create_verifier(config)?,
    })
    .with_comment_policy(RateLimitPolicy::comments(
        config.rate_limit.comment_limit,
        Duration::from_secs(config.rate_limit.comment_window_secs),
    ))
    .with_anonymous_name(config.comments.anonymous_name.clone());

    let admin = AdminCredentials::new(
        config.admin.username.clone(),
        config.admin.password.clone(),
        config.admin_open_without_password(),
    );
    if config.admin.password.is_none() {
        if config.admin_open_without_password() {
            warn!("No admin password configured; admin endpoints are open");
        } else {
            warn!("No admin password configured; admin endpoints are locked");
        }
    }

    Ok(AppState {
        orchestrator: Arc::new(orchestrator),
        api_key_service,
        comments,
        settings,
        cache,
        admin,
    })
}

/// Connect the configured storage backend, migrating Postgres on the way
pub async fn create_storage_backend(config: &AppConfig) -> anyhow::Result<StorageBackend> {
    match config.storage.backend {
        StorageKind::Memory => {
            info!("Using in-memory storage");
            Ok(StorageBackend::InMemory)
        }
        StorageKind::Postgres => {
            let url = config.storage.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("storage.database_url is required for the postgres backend")
            })?;

            info!("Connecting to PostgreSQL...");
            let pool = PostgresConfig::new(url)
                .with_max_connections(config.storage.max_connections)
                .connect()
                .await?;
            run_storage_migrations(&pool).await?;
            info!("PostgreSQL storage ready");

            Ok(StorageBackend::Postgres(pool))
        }
    }
}

fn cache_backend(config: &AppConfig) -> anyhow::Result<CacheBackend> {
    match config.cache.backend {
        CacheKind::Memory => Ok(CacheBackend::InMemory {
            max_capacity: config.cache.max_capacity,
        }),
        CacheKind::Redis => {
            let url = config.cache.redis_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("cache.redis_url is required for the redis backend")
            })?;

            Ok(CacheBackend::Redis(
                RedisCacheConfig::new(url).with_key_prefix(config.cache.key_prefix.clone()),
            ))
        }
    }
}

fn create_verifier(config: &AppConfig) -> anyhow::Result<Arc<dyn HumanVerifier>> {
    if !config.verification_required() {
        info!("Human verification bypassed outside production");
        return Ok(Arc::new(BypassVerifier));
    }

    let secret = config.verification.secret.as_deref().ok_or_else(|| {
        anyhow::anyhow!("verification.secret is required in production")
    })?;

    Ok(Arc::new(TurnstileVerifier::new(
        config.verification.endpoint.clone(),
        secret,
    )?))
}
