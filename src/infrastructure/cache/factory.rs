//! Cache factory for runtime selection

use std::sync::Arc;

use crate::domain::cache::Cache;
use crate::domain::DomainError;

use super::in_memory::InMemoryCache;
use super::redis::{RedisCache, RedisCacheConfig};

/// Cache backend to build
#[derive(Debug, Clone)]
pub enum CacheBackend {
    /// Process-local moka cache
    InMemory { max_capacity: u64 },
    Redis(RedisCacheConfig),
}

/// Factory for creating cache instances
#[derive(Debug)]
pub struct CacheFactory;

impl CacheFactory {
    pub async fn create(backend: &CacheBackend) -> Result<Arc<dyn Cache>, DomainError> {
        match backend {
            CacheBackend::InMemory { max_capacity } => {
                Ok(Arc::new(InMemoryCache::with_capacity(*max_capacity)))
            }
            CacheBackend::Redis(config) => {
                let cache = RedisCache::connect(config.clone()).await?;
                Ok(Arc::new(cache))
            }
        }
    }
}
