//! Comment repository trait

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{Comment, CommentId, CommentStatus};
use crate::domain::content::ContentId;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Repository for reader comments
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync + Debug {
    /// Persist a new comment
    async fn create(&self, comment: Comment) -> Result<Comment, DomainError>;

    /// Get a comment by ID
    async fn get(&self, id: &CommentId) -> Result<Option<Comment>, DomainError>;

    /// Approved comments for a content item, oldest first
    async fn list_approved(&self, content_id: &ContentId) -> Result<Vec<Comment>, DomainError>;

    /// All comments, newest first, optionally filtered by status
    async fn list(&self, status: Option<CommentStatus>) -> Result<Vec<Comment>, DomainError>;

    /// Change the moderation status of a comment
    async fn update_status(
        &self,
        id: &CommentId,
        status: CommentStatus,
    ) -> Result<Comment, DomainError>;

    /// Delete a comment, returns true if it existed
    async fn delete(&self, id: &CommentId) -> Result<bool, DomainError>;
}
