use serde::Deserialize;

use crate::infrastructure::api_key::DEFAULT_KEY_PREFIX;
use crate::infrastructure::rate_limit::FailurePolicy;
use crate::infrastructure::verification::DEFAULT_TURNSTILE_ENDPOINT;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub idempotency: IdempotencyConfig,
    pub verification: VerificationConfig,
    pub api_keys: ApiKeysConfig,
    pub admin: AdminConfig,
    pub comments: CommentsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheKind,
    pub redis_url: Option<String>,
    pub key_prefix: String,
    pub max_capacity: u64,
    /// Bound on every store call made by rate limiting and idempotency
    pub operation_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub comment_limit: u32,
    pub comment_window_secs: u64,
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdempotencyConfig {
    pub retention_secs: u64,
    pub reservation_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub secret: Option<String>,
    pub endpoint: String,
    pub e2e_test_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiKeysConfig {
    pub prefix: String,
    pub usage_queue_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub anonymous_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            database_url: None,
            max_connections: 10,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheKind::default(),
            redis_url: None,
            key_prefix: "content-gateway".to_string(),
            max_capacity: 100_000,
            operation_timeout_ms: 250,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            comment_limit: 5,
            comment_window_secs: 600,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            retention_secs: 86_400,
            reservation_ttl_secs: 30,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            secret: None,
            endpoint: DEFAULT_TURNSTILE_ENDPOINT.to_string(),
            e2e_test_mode: false,
        }
    }
}

impl Default for ApiKeysConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_KEY_PREFIX.to_string(),
            usage_queue_capacity: 1024,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: None,
        }
    }
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            anonymous_name: "Anonymous".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local` and `APP__*` environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Human verification is enforced only in production outside end-to-end runs
    pub fn verification_required(&self) -> bool {
        self.environment.is_production() && !self.verification.e2e_test_mode
    }

    /// Without a password the admin surface is open, except in production
    pub fn admin_open_without_password(&self) -> bool {
        !self.environment.is_production()
    }
}
