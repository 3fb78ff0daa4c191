//! Application configuration

mod app_config;

pub use app_config::{
    AdminConfig, ApiKeysConfig, AppConfig, CacheConfig, CacheKind, CommentsConfig, Environment,
    IdempotencyConfig, LogFormat, LoggingConfig, RateLimitConfig, ServerConfig, StorageConfig,
    StorageKind, VerificationConfig,
};
