//! Storage-backed content repository

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::content::{ContentId, ContentItem, ContentRepository, ContentStatus};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

#[derive(Debug)]
pub struct StorageContentRepository {
    storage: Arc<dyn Storage<ContentItem>>,
}

impl StorageContentRepository {
    pub fn new(storage: Arc<dyn Storage<ContentItem>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ContentRepository for StorageContentRepository {
    async fn get(&self, id: &ContentId) -> Result<Option<ContentItem>, DomainError> {
        self.storage.get(id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ContentItem>, DomainError> {
        Ok(self.storage.find_by_field("slug", slug).await?.into_iter().next())
    }

    async fn create(&self, item: ContentItem) -> Result<ContentItem, DomainError> {
        // The postgres table also carries a unique index on the slug.
        if self.get_by_slug(item.slug()).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "Content with slug '{}' already exists",
                item.slug()
            )));
        }

        self.storage.create(item).await
    }

    async fn list_published(&self, category: Option<String>) -> Result<Vec<ContentItem>, DomainError> {
        let mut items: Vec<ContentItem> = self
            .storage
            .find_by_field("status", ContentStatus::Published.as_str())
            .await?
            .into_iter()
            .filter(|item| item.is_public())
            .filter(|item| category.as_deref().is_none_or(|c| item.category() == c))
            .collect();

        items.sort_by_key(|item| Reverse(item.published_at().unwrap_or(item.created_at())));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::ContentStatus;
    use crate::infrastructure::storage::InMemoryStorage;
    use chrono::{Duration, Utc};

    fn repository() -> StorageContentRepository {
        StorageContentRepository::new(Arc::new(InMemoryStorage::<ContentItem>::new()))
    }

    fn published(slug: &str, category: &str, age_days: i64) -> ContentItem {
        ContentItem::new(slug, slug, "body", category)
            .with_published_at(Utc::now() - Duration::days(age_days))
            .with_status(ContentStatus::Published)
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let repo = repository();
        repo.create(ContentItem::new("same", "A", "a", "dx"))
            .await
            .unwrap();

        let result = repo.create(ContentItem::new("same", "B", "b", "dx")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_get_by_slug_ignores_status() {
        let repo = repository();
        repo.create(ContentItem::new("draft", "D", "d", "dx"))
            .await
            .unwrap();

        let found = repo.get_by_slug("draft").await.unwrap().unwrap();
        assert!(!found.is_public());
    }

    #[tokio::test]
    async fn test_list_published_filters_and_sorts() {
        let repo = repository();
        repo.create(published("old", "dx", 10)).await.unwrap();
        repo.create(published("new", "dx", 1)).await.unwrap();
        repo.create(published("mid", "ops", 5)).await.unwrap();
        repo.create(ContentItem::new("draft", "D", "d", "dx"))
            .await
            .unwrap();

        let all = repo.list_published(None).await.unwrap();
        let slugs: Vec<&str> = all.iter().map(|i| i.slug()).collect();
        assert_eq!(slugs, vec!["new", "mid", "old"]);

        let dx = repo.list_published(Some("dx".to_string())).await.unwrap();
        let slugs: Vec<&str> = dx.iter().map(|i| i.slug()).collect();
        assert_eq!(slugs, vec!["new", "old"]);
    }
}
