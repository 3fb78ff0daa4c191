//! Storage-backed comment repository

use std::cmp::Reverse;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::comment::{Comment, CommentId, CommentRepository, CommentStatus};
use crate::domain::content::ContentId;
use crate::domain::storage::Storage;
use crate::domain::DomainError;

#[derive(Debug)]
pub struct StorageCommentRepository {
    storage: Arc<dyn Storage<Comment>>,
}

impl StorageCommentRepository {
    pub fn new(storage: Arc<dyn Storage<Comment>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl CommentRepository for StorageCommentRepository {
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError> {
        self.storage.create(comment).await
    }

    async fn get(&self, id: &CommentId) -> Result<Option<Comment>, DomainError> {
        self.storage.get(id).await
    }

    async fn list_approved(&self, content_id: &ContentId) -> Result<Vec<Comment>, DomainError> {
        let mut comments: Vec<Comment> = self
            .storage
            .find_by_field("contentId", content_id.as_str())
            .await?
            .into_iter()
            .filter(|c| c.content_id() == content_id && c.is_visible())
            .collect();

        comments.sort_by_key(|c| c.created_at());
        Ok(comments)
    }

    async fn list(&self, status: Option<CommentStatus>) -> Result<Vec<Comment>, DomainError> {
        let mut comments = match status {
            Some(status) => self.storage.find_by_field("status", status.as_str()).await?,
            None => self.storage.list().await?,
        };

        comments.sort_by_key(|c| Reverse(c.created_at()));
        Ok(comments)
    }

    async fn update_status(
        &self,
        id: &CommentId,
        status: CommentStatus,
    ) -> Result<Comment, DomainError> {
        let mut comment = self
            .storage
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Comment '{}' not found", id)))?;

        comment.set_status(status);
        self.storage.update(comment).await
    }

    async fn delete(&self, id: &CommentId) -> Result<bool, DomainError> {
        self.storage.delete(id).await
    }
}
