//! Request and response schemas for the access layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::comment::{Comment, CommentId, CommentStatus};
use crate::domain::content::{ContentId, ContentItem, ContentStatus, FreePreviewMode, PaywallConfig};

/// Upper bound on a comment body, in chars
pub const MAX_COMMENT_CHARS: u64 = 5000;

/// Comment submission payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentRequest {
    #[serde(default, alias = "postId")]
    #[validate(required(message = "is required"), length(min = 1, message = "is required"))]
    pub content_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 100, message = "must be at most 100 characters"))]
    pub author_name: Option<String>,

    #[serde(default)]
    #[validate(email(message = "must be a valid email address"))]
    pub author_email: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "is required"),
        length(
            min = 1,
            max = 5000,
            message = "must be between 1 and 5000 characters"
        )
    )]
    pub body: Option<String>,

    /// Human verification evidence
    #[serde(default, alias = "turnstileToken")]
    pub verification_token: Option<String>,
}

/// Returned after a comment was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentReceipt {
    pub id: CommentId,
    pub status: CommentStatus,
    pub message: String,
}

impl CommentReceipt {
    pub fn for_comment(comment: &Comment) -> Self {
        let message = match comment.status() {
            CommentStatus::Approved => "Comment posted successfully",
            _ => "Comment submitted for approval",
        };

        Self {
            id: comment.id().clone(),
            status: comment.status(),
            message: message.to_string(),
        }
    }
}

/// Public projection of an approved comment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicComment {
    pub id: CommentId,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Comment> for PublicComment {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id().clone(),
            author_name: comment.author_name().to_string(),
            body: comment.body().to_string(),
            created_at: comment.created_at(),
        }
    }
}

/// Programmatic content creation payload
///
/// `createdBy` is never read from the body; the authenticated principal is used.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewContentRequest {
    #[serde(default)]
    #[validate(
        required(message = "is required"),
        length(min = 1, max = 200, message = "must be between 1 and 200 characters")
    )]
    pub slug: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "is required"),
        length(min = 1, max = 300, message = "must be between 1 and 300 characters")
    )]
    pub title: Option<String>,

    #[serde(default)]
    #[validate(required(message = "is required"), length(min = 1, message = "is required"))]
    pub body: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "is required"),
        length(min = 1, max = 100, message = "must be between 1 and 100 characters")
    )]
    pub category: Option<String>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub status: Option<ContentStatus>,

    #[serde(default)]
    pub paywall: Option<PaywallConfig>,

    /// Flat paywall fields; each one set overrides `paywall`
    #[serde(default)]
    pub paywall_enabled: Option<bool>,

    #[serde(default)]
    pub free_mode: Option<FreePreviewMode>,

    #[serde(default)]
    pub free_chars: Option<i64>,

    #[serde(default)]
    pub free_sections: Option<i64>,

    #[serde(default, alias = "priceJpy")]
    pub price: Option<u32>,

    #[serde(default, alias = "publishAt")]
    pub published_at: Option<DateTime<Utc>>,
}

impl NewContentRequest {
    /// Nested paywall (or defaults) with the flat fields laid over it
    pub fn paywall_config(&self) -> PaywallConfig {
        let mut paywall = self.paywall.clone().unwrap_or_default();

        if let Some(enabled) = self.paywall_enabled {
            paywall.enabled = enabled;
        }
        if let Some(mode) = &self.free_mode {
            paywall.free_mode = mode.clone();
        }
        if self.free_chars.is_some() {
            paywall.free_chars = self.free_chars;
        }
        if self.free_sections.is_some() {
            paywall.free_sections = self.free_sections;
        }
        if self.price.is_some() {
            paywall.price = self.price;
        }

        paywall
    }
}

/// Paywall state shown next to a preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaywallDescriptor {
    pub enabled: bool,
    pub has_restricted_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
}

/// Public view of a single item; restricted text is never included
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentView {
    pub id: ContentId,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub preview: String,
    pub paywall: PaywallDescriptor,
}

/// Listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub id: ContentId,
    pub slug: String,
    pub title: String,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub excerpt: String,
    pub paywall_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u32>,
}

impl ContentSummary {
    pub(crate) fn new(item: &ContentItem, excerpt: String) -> Self {
        Self {
            id: item.id().clone(),
            slug: item.slug().to_string(),
            title: item.title().to_string(),
            category: item.category().to_string(),
            tags: item.tags().to_vec(),
            published_at: item.published_at(),
            excerpt,
            paywall_enabled: item.paywall().enabled,
            price: item.paywall().price,
        }
    }
}

/// Offset pagination facts for a listing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

/// One page of the keyed post listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostsPage {
    pub posts: Vec<ContentSummary>,
    pub pagination: Pagination,
}

/// Search match; never carries body text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: ContentId,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub kind: String,
    pub rank: f64,
}

impl SearchHit {
    pub(crate) fn new(item: &ContentItem, rank: f64) -> Self {
        Self {
            id: item.id().clone(),
            slug: item.slug().to_string(),
            title: item.title().to_string(),
            summary: item.summary().map(str::to_string),
            category: item.category().to_string(),
            tags: item.tags().to_vec(),
            published_at: item.published_at(),
            kind: "post".to_string(),
            rank,
        }
    }
}

/// Search response; `query` echoes the raw input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
    pub total: usize,
    pub query: String,
}

impl SearchResults {
    pub(crate) fn empty(query: &str) -> Self {
        Self {
            results: Vec::new(),
            total: 0,
            query: query.to_string(),
        }
    }
}
