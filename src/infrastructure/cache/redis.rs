//! Redis cache implementation

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

/// INCR and set the expiry in one round trip, only when the counter is new
static INCREMENT_WITH_EXPIRY: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local count = redis.call('INCR', KEYS[1])
        if count == 1 then
            redis.call('PEXPIRE', KEYS[1], ARGV[1])
        end
        return count
        "#,
    )
});

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Namespace prepended to every key
    pub key_prefix: Option<String>,
}

impl RedisCacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: None,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Redis cache shared by all replicas
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("key_prefix", &self.config.key_prefix)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCache {
    /// Connect to Redis
    pub async fn connect(config: RedisCacheConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    fn prefix_key(&self, key: &str) -> String {
        prefixed(self.config.key_prefix.as_deref(), key)
    }
}

/// Joins with exactly one `:`, whether or not the prefix already ends in one
fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix.map(|p| p.trim_end_matches(':')) {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, key),
        _ => key.to_string(),
    }
}

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection.clone();

        let value: Option<String> = conn
            .get(self.prefix_key(key))
            .await
            .map_err(|e| DomainError::cache(format!("Failed to get key '{}': {}", key, e)))?;

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: () = conn
            .pset_ex(self.prefix_key(key), value, ttl_millis(ttl))
            .await
            .map_err(|e| DomainError::cache(format!("Failed to set key '{}': {}", key, e)))?;

        Ok(())
    }

    async fn set_nx_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        // SET NX PX replies OK when set and nil when the key exists
        let result: Option<String> = redis::cmd("SET")
            .arg(self.prefix_key(key))
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to set_nx key '{}': {}", key, e)))?;

        Ok(result.is_some())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let deleted: i64 = conn
            .del(self.prefix_key(key))
            .await
            .map_err(|e| DomainError::cache(format!("Failed to delete key '{}': {}", key, e)))?;

        Ok(deleted > 0)
    }

    async fn increment_with_expiry(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<i64, DomainError> {
        let mut conn = self.connection.clone();

        let count: i64 = INCREMENT_WITH_EXPIRY
            .key(self.prefix_key(key))
            .arg(ttl_millis(window))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to increment '{}': {}", key, e)))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefixing() {
        assert_eq!(prefixed(Some("cg"), "rate:comment:1.2.3.4"), "cg:rate:comment:1.2.3.4");
        assert_eq!(prefixed(Some("cg:"), "rate:x"), "cg:rate:x");
        assert_eq!(prefixed(Some(":"), "k"), "k");
        assert_eq!(prefixed(Some(""), "k"), "k");
        assert_eq!(prefixed(None, "k"), "k");
    }

    #[test]
    fn test_ttl_millis_never_zero() {
        assert_eq!(ttl_millis(Duration::ZERO), 1);
        assert_eq!(ttl_millis(Duration::from_secs(600)), 600_000);
    }

    #[test]
    fn test_config_builder() {
        let config = RedisCacheConfig::new("redis://localhost:6379").with_key_prefix("cg");

        assert_eq!(config.url, "redis://localhost:6379");
        assert_eq!(config.key_prefix.as_deref(), Some("cg"));
    }
}
