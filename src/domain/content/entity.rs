//! Content item entity and paywall configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::storage::{StorageEntity, StorageKey};

/// Content identifier (UUID string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Generate a fresh identifier
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

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for ContentId {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// Publication status of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    #[default]
    Draft,
    Scheduled,
    Published,
}

impl ContentStatus {
    /// Only published items are visible on the public surface
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Published)
    }

    /// Stored form of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
        }
    }
}

/// How the free-to-read prefix of a paywalled item is chosen
///
/// Stored as a plain string. Values this build does not recognise are kept
/// as [`FreePreviewMode::Other`] and split as "nothing restricted".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FreePreviewMode {
    /// Split at an explicit break token in the body
    Marker,
    /// Split after a fixed number of characters
    Chars,
    /// Split after a number of second-level heading blocks
    Sections,
    Other(String),
}

impl FreePreviewMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Marker => "marker",
            Self::Chars => "chars",
            Self::Sections => "sections",
            Self::Other(value) => value,
        }
    }
}

impl Default for FreePreviewMode {
    fn default() -> Self {
        Self::Chars
    }
}

impl From<String> for FreePreviewMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "marker" => Self::Marker,
            "chars" => Self::Chars,
            "sections" => Self::Sections,
            _ => Self::Other(value),
        }
    }
}

impl From<FreePreviewMode> for String {
    fn from(mode: FreePreviewMode) -> Self {
        match mode {
            FreePreviewMode::Other(value) => value,
            other => other.as_str().to_string(),
        }
    }
}

/// Paywall settings attached to a content item
///
/// Only the parameter belonging to the active mode is read; the others are
/// carried as-is. Absent fields take the values of [`PaywallConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaywallConfig {
    pub enabled: bool,
    pub free_mode: FreePreviewMode,
    pub free_chars: Option<i64>,
    pub free_sections: Option<i64>,
    #[serde(alias = "priceJpy")]
    pub price: Option<u32>,
}

impl Default for PaywallConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            free_mode: FreePreviewMode::Chars,
            free_chars: Some(300),
            free_sections: Some(0),
            price: None,
        }
    }
}

impl PaywallConfig {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn marker() -> Self {
        Self {
            enabled: true,
            free_mode: FreePreviewMode::Marker,
            ..Self::default()
        }
    }

    pub fn chars(count: i64) -> Self {
        Self {
            enabled: true,
            free_mode: FreePreviewMode::Chars,
            free_chars: Some(count),
            ..Self::default()
        }
    }

    pub fn sections(count: i64) -> Self {
        Self {
            enabled: true,
            free_mode: FreePreviewMode::Sections,
            free_sections: Some(count),
            ..Self::default()
        }
    }

    pub fn with_price(mut self, price: u32) -> Self {
        self.price = Some(price);
        self
    }
}

/// A piece of published or draft content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    id: ContentId,
    slug: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    body: String,
    category: String,
    #[serde(default)]
    tags: Vec<String>,
    status: ContentStatus,
    #[serde(default)]
    paywall: PaywallConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StorageEntity for ContentItem {
    type Key = ContentId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl ContentItem {
    /// Create a new draft item
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: ContentId::generate(),
            slug: slug.into(),
            title: title.into(),
            summary: None,
            body: body.into(),
            category: category.into(),
            tags: Vec::new(),
            status: ContentStatus::Draft,
            paywall: PaywallConfig::default(),
            created_by: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_paywall(mut self, paywall: PaywallConfig) -> Self {
        self.paywall = paywall;
        self
    }

    pub fn with_created_by(mut self, principal: impl Into<String>) -> Self {
        self.created_by = Some(principal.into());
        self
    }

    /// Set the status; publishing stamps the publication time if unset
    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = status;

        if status.is_public() && self.published_at.is_none() {
            self.published_at = Some(Utc::now());
        }

        self
    }

    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    pub fn id(&self) -> &ContentId {
        &self.id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn status(&self) -> ContentStatus {
        self.status
    }

    pub fn paywall(&self) -> &PaywallConfig {
        &self.paywall
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether anonymous readers may see this item
    pub fn is_public(&self) -> bool {
        self.status.is_public()
    }
}
