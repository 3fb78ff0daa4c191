//! Storage-backed settings repository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::settings::{SettingsKey, SettingsRepository, SiteSettings};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

#[derive(Debug)]
pub struct StorageSettingsRepository {
    storage: Arc<dyn Storage<SiteSettings>>,
}

impl StorageSettingsRepository {
    pub fn new(storage: Arc<dyn Storage<SiteSettings>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl SettingsRepository for StorageSettingsRepository {
    async fn get_settings(&self) -> Result<SiteSettings, DomainError> {
        Ok(self
            .storage
            .get(&SettingsKey::default())
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, mut settings: SiteSettings) -> Result<SiteSettings, DomainError> {
        settings.updated_at = Utc::now();
        self.storage.save(settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::ModerationPolicy;
    use crate::infrastructure::storage::InMemoryStorage;

    #[tokio::test]
    async fn test_defaults_to_pre_moderation_when_unset() {
        let repo = StorageSettingsRepository::new(Arc::new(InMemoryStorage::<SiteSettings>::new()));

        assert_eq!(
            repo.get_moderation_policy().await.unwrap(),
            ModerationPolicy::Pre
        );
    }

    #[tokio::test]
    async fn test_save_replaces_settings() {
        let repo = StorageSettingsRepository::new(Arc::new(InMemoryStorage::<SiteSettings>::new()));

        repo.save(SiteSettings::new(
            Some("Blog".to_string()),
            ModerationPolicy::Post,
        ))
        .await
        .unwrap();
        repo.save(SiteSettings::new(None, ModerationPolicy::Post))
            .await
            .unwrap();

        let settings = repo.get_settings().await.unwrap();
        assert_eq!(settings.comment_mode, ModerationPolicy::Post);
        assert!(settings.site_title.is_none());
    }
}
