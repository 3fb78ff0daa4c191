//! Content repository trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{ContentId, ContentItem};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository for content items
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync + Debug {
    /// Get an item by its ID
    async fn get(&self, id: &ContentId) -> Result<Option<ContentItem>, DomainError>;

    /// Get an item by its slug, whatever its status
    async fn get_by_slug(&self, slug: &str) -> Result<Option<ContentItem>, DomainError>;

    /// Create a new item; a taken slug is a conflict
    async fn create(&self, item: ContentItem) -> Result<ContentItem, DomainError>;

    /// Published items, newest first, optionally narrowed to one category
    async fn list_published(&self, category: Option<String>) -> Result<Vec<ContentItem>, DomainError>;
}
