//! API key service
//!
//! Issues, lists, toggles and deletes keys, and authenticates presented keys.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository, AuthenticatedKey};
use crate::domain::DomainError;

use super::generator::ApiKeyGenerator;
use super::usage::UsageRecorder;

/// A freshly issued key together with its plaintext secret
#[derive(Debug)]
pub struct CreatedApiKey {
    pub api_key: ApiKey,
    /// Returned exactly once; not recoverable afterwards
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct ApiKeyService {
    repository: Arc<dyn ApiKeyRepository>,
    generator: ApiKeyGenerator,
    usage: UsageRecorder,
}

impl ApiKeyService {
    pub fn new(
        repository: Arc<dyn ApiKeyRepository>,
        generator: ApiKeyGenerator,
        usage: UsageRecorder,
    ) -> Self {
        Self {
            repository,
            generator,
            usage,
        }
    }

    /// Issue a new active key
    pub async fn create(
        &self,
        name: impl Into<String>,
        created_by: Option<String>,
    ) -> Result<CreatedApiKey, DomainError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }

        let generated = self.generator.generate();
        let mut api_key = ApiKey::new(name.trim(), generated.hash, &generated.display_prefix);

        if let Some(principal) = created_by {
            api_key = api_key.with_created_by(principal);
        }

        let created = self.repository.create(api_key).await?;

        info!(
            key_id = %created.id(),
            key_prefix = %created.key_prefix(),
            "API key created"
        );

        Ok(CreatedApiKey {
            api_key: created,
            secret: generated.key,
        })
    }

    pub async fn list(&self) -> Result<Vec<ApiKey>, DomainError> {
        self.repository.list().await
    }

    /// Enable or disable a key
    pub async fn set_active(&self, id: &ApiKeyId, active: bool) -> Result<ApiKey, DomainError> {
        let updated = self
            .repository
            .set_active(id, active)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))?;

        info!(key_id = %id, active, "API key status changed");
        Ok(updated)
    }

    /// Permanently delete a key
    pub async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        let deleted = self.repository.delete(id).await?;

        if deleted {
            info!(key_id = %id, "API key deleted");
        }

        Ok(deleted)
    }

    /// Authenticate a presented key
    ///
    /// Absent, unknown and inactive keys all yield `Ok(None)`. Store failures
    /// are returned as errors so the caller can reject the request.
    pub async fn authenticate(
        &self,
        presented: Option<&str>,
    ) -> Result<Option<AuthenticatedKey>, DomainError> {
        let Some(token) = presented.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let hash = ApiKeyGenerator::hash_key(token);
        let Some(api_key) = self.repository.find_by_secret_hash(&hash).await? else {
            debug!("Unknown API key presented");
            return Ok(None);
        };

        if !ApiKeyGenerator::verify_key(token, api_key.secret_hash()) {
            return Ok(None);
        }

        if !api_key.is_active() {
            debug!(key_id = %api_key.id(), "Inactive API key presented");
            return Ok(None);
        }

        self.usage.record(api_key.id());

        Ok(Some(AuthenticatedKey::from(&api_key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::api_key::MockApiKeyRepository;
    use crate::infrastructure::api_key::StorageApiKeyRepository;
    use crate::infrastructure::storage::InMemoryStorage;
    use std::time::Duration;

    fn service() -> (ApiKeyService, Arc<dyn ApiKeyRepository>) {
        let repo: Arc<dyn ApiKeyRepository> = Arc::new(StorageApiKeyRepository::new(Arc::new(
            InMemoryStorage::<ApiKey>::new(),
        )));
        let usage = UsageRecorder::spawn(repo.clone(), 8);

        (
            ApiKeyService::new(repo.clone(), ApiKeyGenerator::default(), usage),
            repo,
        )
    }

    #[tokio::test]
    async fn test_create_returns_secret_once_and_stores_digest() {
        let (service, repo) = service();

        let created = service.create("ci", None).await.unwrap();
        assert!(created.secret.starts_with("blog_"));

        let stored = repo.get(created.api_key.id()).await.unwrap().unwrap();
        assert_ne!(stored.secret_hash(), created.secret);
        assert!(created.secret.starts_with(stored.key_prefix()));
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let (service, _) = service();

        let result = service.create("   ", None).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_valid_key() {
        let (service, repo) = service();
        let created = service
            .create("ci", Some("ops@example.com".to_string()))
            .await
            .unwrap();

        let auth = service
            .authenticate(Some(&created.secret))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(&auth.id, created.api_key.id());
        assert_eq!(auth.principal, "ops@example.com");

        let mut usage = 0;
        for _ in 0..100 {
            usage = repo.get(&auth.id).await.unwrap().unwrap().usage_count();
            if usage == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(usage, 1);
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_keys_are_indistinguishable() {
        let (service, _) = service();
        let created = service.create("ci", None).await.unwrap();
        service
            .set_active(created.api_key.id(), false)
            .await
            .unwrap();

        let unknown = service
            .authenticate(Some("blog_doesnotexist"))
            .await
            .unwrap();
        let inactive = service.authenticate(Some(&created.secret)).await.unwrap();
        let missing = service.authenticate(None).await.unwrap();
        let blank = service.authenticate(Some("  ")).await.unwrap();

        assert_eq!(unknown, None);
        assert_eq!(inactive, None);
        assert_eq!(missing, None);
        assert_eq!(blank, None);
    }

    #[tokio::test]
    async fn test_reactivated_key_authenticates_again() {
        let (service, _) = service();
        let created = service.create("ci", None).await.unwrap();

        service.set_active(created.api_key.id(), false).await.unwrap();
        service.set_active(created.api_key.id(), true).await.unwrap();

        let auth = service.authenticate(Some(&created.secret)).await.unwrap();
        assert!(auth.is_some());
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error() {
        let mut mock = MockApiKeyRepository::new();
        mock.expect_find_by_secret_hash()
            .returning(|_| Err(DomainError::storage("down")));

        let repo: Arc<dyn ApiKeyRepository> = Arc::new(mock);
        let usage = UsageRecorder::spawn(repo.clone(), 1);
        let service = ApiKeyService::new(repo, ApiKeyGenerator::default(), usage);

        let result = service.authenticate(Some("blog_whatever")).await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }

    #[tokio::test]
    async fn test_set_active_missing_key() {
        let (service, _) = service();

        let result = service.set_active(&ApiKeyId::new("missing"), true).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }
}
