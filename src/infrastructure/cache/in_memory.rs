//! In-memory cache implementation using moka
//!
//! Suitable for a single replica only: counters and reservations are not
//! shared across processes.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache as MokaCache;
use moka::ops::compute::{CompResult, Op};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

const DEFAULT_MAX_CAPACITY: u64 = 100_000;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: impl Into<String>, ttl: Duration) -> Self {
        Self {
            data: data.into(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Evicts each entry at its own deadline
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        created_at: Instant,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(created_at))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.expires_at.saturating_duration_since(updated_at))
    }
}

/// Thread-safe in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();

        Self { cache }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let now = Instant::now();

        Ok(self
            .cache
            .get(key)
            .await
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.data))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        self.cache
            .insert(key.to_string(), CacheEntry::new(value, ttl))
            .await;
        Ok(())
    }

    async fn set_nx_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, DomainError> {
        let now = Instant::now();

        let result = self
            .cache
            .entry(key.to_string())
            .and_compute_with(|existing| {
                let op = match existing {
                    Some(entry) if entry.value().is_live(now) => Op::Nop,
                    _ => Op::Put(CacheEntry::new(value, ttl)),
                };
                std::future::ready(op)
            })
            .await;

        Ok(matches!(
            result,
            CompResult::Inserted(_) | CompResult::ReplacedWith(_)
        ))
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn increment_with_expiry(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<i64, DomainError> {
        let now = Instant::now();

        let result = self
            .cache
            .entry(key.to_string())
            .and_compute_with(|existing| {
                let op = match existing.map(|e| e.into_value()) {
                    Some(entry) if entry.is_live(now) => match entry.data.parse::<i64>() {
                        Ok(count) => Op::Put(CacheEntry {
                            data: (count + 1).to_string(),
                            expires_at: entry.expires_at,
                        }),
                        Err(_) => Op::Nop,
                    },
                    _ => Op::Put(CacheEntry::new("1", window)),
                };
                std::future::ready(op)
            })
            .await;

        match result {
            CompResult::Inserted(entry) | CompResult::ReplacedWith(entry) => {
                entry.into_value().data.parse::<i64>().map_err(|e| {
                    DomainError::cache(format!("Counter '{}' is not an integer: {}", key, e))
                })
            }
            _ => Err(DomainError::cache(format!(
                "Counter '{}' holds a non-numeric value",
                key
            ))),
        }
    }
}
