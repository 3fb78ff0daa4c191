//! API key repository trait

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entity::{ApiKey, ApiKeyId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository trait for API key storage
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    /// Get an API key by its ID
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// Look up a key by the digest of its secret
    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<ApiKey>, DomainError>;

    /// Create a new API key
    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError>;

    /// Set only the active flag of a key, returning the stored result
    async fn set_active(&self, id: &ApiKeyId, active: bool) -> Result<Option<ApiKey>, DomainError>;

    /// Delete an API key
    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError>;

    /// List all API keys
    async fn list(&self) -> Result<Vec<ApiKey>, DomainError>;

    /// Bump the usage counter and last-used time of a key
    ///
    /// Touches no other field, so it never undoes a concurrent `set_active`.
    async fn record_usage(&self, id: &ApiKeyId, at: DateTime<Utc>) -> Result<(), DomainError>;
}
