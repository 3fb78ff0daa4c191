//! Reader comment entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::content::ContentId;
use crate::domain::storage::{StorageEntity, StorageKey};

/// Comment identifier (UUID string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for CommentId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Moderation state of a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("Unknown comment status '{}'", other)),
        }
    }
}

/// A reader comment attached to a content item
///
/// The submitter is only ever recorded as a truncated digest of their address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    id: CommentId,
    content_id: ContentId,
    author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author_email: Option<String>,
    body: String,
    status: CommentStatus,
    submitter_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StorageEntity for Comment {
    type Key = CommentId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl Comment {
    pub fn new(
        content_id: ContentId,
        author_name: impl Into<String>,
        body: impl Into<String>,
        status: CommentStatus,
        submitter_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: CommentId::generate(),
            content_id,
            author_name: author_name.into(),
            author_email: None,
            body: body.into(),
            status,
            submitter_hash: submitter_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_author_email(mut self, email: impl Into<String>) -> Self {
        self.author_email = Some(email.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self.updated_at = at;
        self
    }

    pub fn id(&self) -> &CommentId {
        &self.id
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    pub fn author_name(&self) -> &str {
        &self.author_name
    }

    pub fn author_email(&self) -> Option<&str> {
        self.author_email.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn status(&self) -> CommentStatus {
        self.status
    }

    pub fn submitter_hash(&self) -> &str {
        &self.submitter_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the comment is shown on the public surface
    pub fn is_visible(&self) -> bool {
        self.status == CommentStatus::Approved
    }

    pub fn set_status(&mut self, status: CommentStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_approved_is_visible() {
        let mut comment = Comment::new(
            ContentId::new("c1"),
            "Anonymous",
            "hi",
            CommentStatus::Pending,
            "0123456789abcdef",
        );
        assert!(!comment.is_visible());

        comment.set_status(CommentStatus::Approved);
        assert!(comment.is_visible());

        comment.set_status(CommentStatus::Rejected);
        assert!(!comment.is_visible());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("approved".parse::<CommentStatus>(), Ok(CommentStatus::Approved));
        assert!("spam".parse::<CommentStatus>().is_err());
    }
}
