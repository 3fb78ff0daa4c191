//! Storage-backed API key repository implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Storage-backed implementation of ApiKeyRepository
#[derive(Debug)]
pub struct StorageApiKeyRepository {
    storage: Arc<dyn Storage<ApiKey>>,
}

impl StorageApiKeyRepository {
    pub fn new(storage: Arc<dyn Storage<ApiKey>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ApiKeyRepository for StorageApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        self.storage.get(id).await
    }

    async fn find_by_secret_hash(&self, secret_hash: &str) -> Result<Option<ApiKey>, DomainError> {
        Ok(self
            .storage
            .find_by_field("secretHash", secret_hash)
            .await?
            .into_iter()
            .next())
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        self.storage.create(api_key).await
    }

    async fn set_active(&self, id: &ApiKeyId, active: bool) -> Result<Option<ApiKey>, DomainError> {
        self.storage
            .patch(id, ApiKey::activation_fields(active))
            .await
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        self.storage.delete(id).await
    }

    async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        let mut keys = self.storage.list().await?;
        keys.sort_by_key(|k| k.created_at());
        Ok(keys)
    }

    async fn record_usage(&self, id: &ApiKeyId, at: DateTime<Utc>) -> Result<(), DomainError> {
        self.storage
            .increment(id, ApiKey::USAGE_COUNT_FIELD, ApiKey::usage_fields(at))
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))?;
        Ok(())
    }
}
