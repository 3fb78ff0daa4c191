//! Access orchestrator
//!
//! Runs the public content reads and the two write pipelines (comment
//! submission and programmatic content creation) against explicitly
//! injected collaborators. Every collaborator failure leaves this module as
//! an [`AccessError`].

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::domain::access::{AccessError, SubmissionStage};
use crate::domain::api_key::AuthenticatedKey;
use crate::domain::comment::{Comment, CommentRepository};
use crate::domain::content::{
    excerpt_from_preview, preview_text, split, ContentId, ContentItem, ContentRepository,
    ContentStatus, DEFAULT_EXCERPT_CHARS,
};
use crate::domain::settings::SettingsRepository;
use crate::domain::verification::HumanVerifier;
use crate::infrastructure::api_key::ApiKeyService;
use crate::infrastructure::idempotency::{
    IdempotencyCache, IdempotencyCheck, StoredResponse, MAX_IDEMPOTENCY_KEY_LEN,
};
use crate::infrastructure::rate_limit::{RateLimitPolicy, RateLimiter};

use super::requests::{
    CommentReceipt, ContentSummary, ContentView, NewCommentRequest, NewContentRequest,
    Pagination, PaywallDescriptor, PostsPage, PublicComment, SearchHit, SearchResults,
};

/// Listing size when the caller gives none
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Largest listing a caller may request
pub const MAX_LIST_LIMIT: usize = 100;

/// Category value that means "no category filter"
pub const ALL_CATEGORIES: &str = "all";

/// Shorter search queries return no results
pub const MIN_SEARCH_CHARS: usize = 2;

/// Length of the stored submitter digest, in hex chars
const SUBMITTER_HASH_LEN: usize = 16;

static SLUG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s/?#]+$").unwrap());

/// Anything but ASCII word chars, whitespace and CJK is replaced by a space
static SEARCH_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s\x{3000}-\x{9fff}]").unwrap());

/// Per-request caller facts extracted at the HTTP edge
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub client_ip: String,
    pub idempotency_key: Option<String>,
}

impl RequestContext {
    pub fn new(client_ip: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}

/// Collaborators the orchestrator is built from
#[derive(Debug, Clone)]
pub struct AccessOrchestratorDeps {
    pub content: Arc<dyn ContentRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub api_keys: ApiKeyService,
    pub rate_limiter: RateLimiter,
    pub idempotency: IdempotencyCache,
    pub verifier: Arc<dyn HumanVerifier>,
}

#[derive(Debug, Clone)]
pub struct AccessOrchestrator {
    deps: AccessOrchestratorDeps,
    comment_policy: RateLimitPolicy,
    anonymous_name: String,
}

impl AccessOrchestrator {
    pub fn new(deps: AccessOrchestratorDeps) -> Self {
        Self {
            deps,
            comment_policy: RateLimitPolicy::default(),
            anonymous_name: "Anonymous".to_string(),
        }
    }

    pub fn with_comment_policy(mut self, policy: RateLimitPolicy) -> Self {
        self.comment_policy = policy;
        self
    }

    pub fn with_anonymous_name(mut self, name: impl Into<String>) -> Self {
        self.anonymous_name = name.into();
        self
    }

    /// Single published item, split into its free preview
    pub async fn read_content(&self, slug: &str) -> Result<ContentView, AccessError> {
        let item = self
            .deps
            .content
            .get_by_slug(slug)
            .await?
            .filter(ContentItem::is_public)
            .ok_or_else(|| AccessError::not_found("Content not found"))?;

        let parts = split(&item);

        Ok(ContentView {
            id: item.id().clone(),
            slug: item.slug().to_string(),
            title: item.title().to_string(),
            summary: item.summary().map(str::to_string),
            category: item.category().to_string(),
            tags: item.tags().to_vec(),
            published_at: item.published_at(),
            paywall: PaywallDescriptor {
                enabled: item.paywall().enabled,
                has_restricted_content: parts.has_restricted_content(),
                price: item.paywall().price,
            },
            preview: parts.preview,
        })
    }

    /// Newest published items, optionally within one category
    pub async fn list_content(
        &self,
        category: Option<String>,
        limit: Option<usize>,
    ) -> Result<Vec<ContentSummary>, AccessError> {
        let limit = clamp_limit(limit);
        let items = self
            .deps
            .content
            .list_published(category_filter(category))
            .await?;

        Ok(items.iter().take(limit).map(summarize).collect())
    }

    /// Offset page of published items for API key holders
    pub async fn list_posts(
        &self,
        category: Option<String>,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<PostsPage, AccessError> {
        let limit = clamp_limit(limit);
        let offset = offset.unwrap_or(0);
        let items = self
            .deps
            .content
            .list_published(category_filter(category))
            .await?;

        let total = items.len();
        let posts: Vec<ContentSummary> =
            items.iter().skip(offset).take(limit).map(summarize).collect();
        let has_more = offset.saturating_add(posts.len()) < total;

        Ok(PostsPage {
            posts,
            pagination: Pagination {
                total,
                limit,
                offset,
                has_more,
            },
        })
    }

    /// Published items matching a free-text query, best match first
    ///
    /// Only titles, summaries and tags are searched, so restricted body text
    /// never shows up in the result set.
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<SearchResults, AccessError> {
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Ok(SearchResults::empty(query));
        }

        let sanitized = sanitize_query(query);
        if sanitized.is_empty() {
            return Ok(SearchResults::empty(query));
        }

        let items = self.deps.content.list_published(None).await?;
        let mut hits: Vec<(f64, &ContentItem)> = items
            .iter()
            .filter_map(|item| search_rank(item, &sanitized).map(|rank| (rank, item)))
            .collect();

        hits.sort_by(|(rank_a, a), (rank_b, b)| {
            rank_b
                .total_cmp(rank_a)
                .then_with(|| recency(b).cmp(&recency(a)))
        });
        hits.truncate(clamp_limit(limit));

        let results: Vec<SearchHit> = hits
            .into_iter()
            .map(|(rank, item)| SearchHit::new(item, rank))
            .collect();

        debug!(matches = results.len(), "Search completed");

        Ok(SearchResults {
            total: results.len(),
            results,
            query: query.to_string(),
        })
    }

    /// Approved comments for an item, oldest first
    pub async fn list_approved_comments(
        &self,
        content_id: Option<&str>,
    ) -> Result<Vec<PublicComment>, AccessError> {
        let content_id = content_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AccessError::validation("contentId is required"))?;

        let comments = self
            .deps
            .comments
            .list_approved(&ContentId::new(content_id))
            .await?;

        Ok(comments.iter().map(PublicComment::from).collect())
    }

    /// Submit a reader comment
    ///
    /// Returns the response to send, which for a repeated idempotency key is
    /// the stored response of the first request.
    pub async fn submit_comment(
        &self,
        ctx: &RequestContext,
        request: NewCommentRequest,
    ) -> Result<StoredResponse, AccessError> {
        if let Some(key) = &ctx.idempotency_key {
            if key.chars().count() > MAX_IDEMPOTENCY_KEY_LEN {
                return Err(AccessError::validation(format!(
                    "Idempotency-Key must be at most {} characters",
                    MAX_IDEMPOTENCY_KEY_LEN
                )));
            }
        }

        let reservation = match self
            .deps
            .idempotency
            .check_and_reserve(ctx.idempotency_key.as_deref())
            .await
        {
            IdempotencyCheck::Cached(response) => {
                debug!(stage = %SubmissionStage::Responded, "Replayed comment submission");
                return Ok(response);
            }
            IdempotencyCheck::InFlight => {
                return Err(AccessError::conflict(
                    "A request with this Idempotency-Key is already in progress",
                ));
            }
            IdempotencyCheck::Reserved(reservation) => Some(reservation),
            IdempotencyCheck::Disabled => None,
        };

        let mut stage = SubmissionStage::KeyChecked;
        let result = self.run_comment_pipeline(ctx, request, &mut stage).await;

        match (reservation, &result) {
            (Some(reservation), Ok(response)) => {
                self.deps.idempotency.commit(reservation, response).await
            }
            (Some(reservation), Err(_)) => self.deps.idempotency.release(reservation).await,
            (None, _) => {}
        }

        match &result {
            Ok(_) => debug!(stage = %stage, "Comment submission completed"),
            Err(AccessError::Dependency(message)) => {
                error!(stage = %stage, error = %message, "Comment submission failed")
            }
            Err(e) => info!(stage = %stage, kind = e.kind(), "Comment submission rejected"),
        }

        result
    }

    async fn run_comment_pipeline(
        &self,
        ctx: &RequestContext,
        mut request: NewCommentRequest,
        stage: &mut SubmissionStage,
    ) -> Result<StoredResponse, AccessError> {
        if !self
            .deps
            .rate_limiter
            .check(&self.comment_policy, &ctx.client_ip)
            .await
        {
            return Err(AccessError::RateLimited);
        }
        *stage = SubmissionStage::RateChecked;

        request.author_name = non_blank(request.author_name);
        request.author_email = non_blank(request.author_email);
        request.validate()?;

        let (Some(content_id), Some(body)) = (request.content_id, request.body) else {
            return Err(AccessError::validation("Missing required fields"));
        };
        if body.trim().is_empty() {
            return Err(AccessError::validation(
                "body must be between 1 and 5000 characters",
            ));
        }

        let content = self
            .deps
            .content
            .get(&ContentId::new(content_id.trim()))
            .await?
            .filter(ContentItem::is_public)
            .ok_or_else(|| AccessError::not_found("Content not found"))?;
        *stage = SubmissionStage::Validated;

        if self.deps.verifier.is_required() {
            let token = non_blank(request.verification_token)
                .ok_or_else(|| AccessError::validation("Verification token is required"))?;

            let verified = self
                .deps
                .verifier
                .verify(&token, Some(ctx.client_ip.clone()))
                .await?;
            if !verified {
                return Err(AccessError::Verification);
            }
        }
        *stage = SubmissionStage::HumanVerified;

        let policy = self.deps.settings.get_moderation_policy().await?;

        let mut comment = Comment::new(
            content.id().clone(),
            request
                .author_name
                .unwrap_or_else(|| self.anonymous_name.clone()),
            body,
            policy.initial_status(),
            submitter_hash(&ctx.client_ip),
        );
        if let Some(email) = request.author_email {
            comment = comment.with_author_email(email);
        }

        let comment = self.deps.comments.create(comment).await?;
        *stage = SubmissionStage::Persisted;

        info!(
            comment_id = %comment.id(),
            content_id = %comment.content_id(),
            status = comment.status().as_str(),
            "Comment stored"
        );

        let body = serde_json::to_value(CommentReceipt::for_comment(&comment))
            .map_err(|e| AccessError::dependency(format!("Failed to encode response: {}", e)))?;
        *stage = SubmissionStage::Responded;

        Ok(StoredResponse { status: 201, body })
    }

    /// Authenticate a presented API key
    ///
    /// Absent, unknown and inactive keys are indistinguishable to the caller.
    pub async fn authenticate(
        &self,
        presented: Option<&str>,
    ) -> Result<AuthenticatedKey, AccessError> {
        match self.deps.api_keys.authenticate(presented).await {
            Ok(Some(key)) => Ok(key),
            Ok(None) => Err(AccessError::Authentication),
            Err(e) => {
                warn!(error = %e, "API key store unavailable, rejecting request");
                Err(AccessError::dependency(e.to_string()))
            }
        }
    }

    /// Create a content item on behalf of an authenticated key
    pub async fn create_content(
        &self,
        caller: &AuthenticatedKey,
        request: NewContentRequest,
    ) -> Result<ContentItem, AccessError> {
        if request.slug.is_none()
            || request.title.is_none()
            || request.body.is_none()
            || request.category.is_none()
        {
            return Err(AccessError::validation("Missing required fields"));
        }
        request.validate()?;

        let paywall = request.paywall_config();
        let (Some(slug), Some(title), Some(body), Some(category)) =
            (request.slug, request.title, request.body, request.category)
        else {
            return Err(AccessError::validation("Missing required fields"));
        };

        let slug = slug.trim().to_string();
        if !SLUG_PATTERN.is_match(&slug) {
            return Err(AccessError::validation(
                "slug must not contain whitespace, '/', '?' or '#'",
            ));
        }

        let mut item = ContentItem::new(slug, title.trim(), body, category.trim())
            .with_tags(request.tags)
            .with_paywall(paywall)
            .with_created_by(&caller.principal);

        if let Some(summary) = non_blank(request.summary) {
            item = item.with_summary(summary);
        }
        if let Some(at) = request.published_at {
            item = item.with_published_at(at);
        }
        item = item.with_status(request.status.unwrap_or(ContentStatus::Draft));

        let created = self.deps.content.create(item).await?;

        info!(
            content_id = %created.id(),
            slug = created.slug(),
            key_id = %caller.id,
            "Content created"
        );

        Ok(created)
    }
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

fn category_filter(category: Option<String>) -> Option<String> {
    category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty() && c != ALL_CATEGORIES)
}

fn summarize(item: &ContentItem) -> ContentSummary {
    let excerpt = match item.summary() {
        Some(summary) if !summary.trim().is_empty() => summary.to_string(),
        _ => excerpt_from_preview(&preview_text(item), DEFAULT_EXCERPT_CHARS),
    };
    ContentSummary::new(item, excerpt)
}

fn recency(item: &ContentItem) -> chrono::DateTime<chrono::Utc> {
    item.published_at().unwrap_or(item.created_at())
}

pub(crate) fn sanitize_query(query: &str) -> String {
    SEARCH_NOISE.replace_all(query, " ").trim().to_string()
}

/// `None` when the item does not match
///
/// Every query term must occur (case-insensitively) in the title, a tag or
/// the summary. This also covers whole-title substrings and exact tags. Term
/// hits weigh title over tags over summary.
fn search_rank(item: &ContentItem, sanitized: &str) -> Option<f64> {
    let needle = sanitized.to_lowercase();
    let title = item.title().to_lowercase();
    let summary = item.summary().unwrap_or_default().to_lowercase();
    let tags: Vec<String> = item.tags().iter().map(|t| t.to_lowercase()).collect();

    let mut rank = 0.0;
    for term in needle.split_whitespace() {
        let mut weight = 0.0;
        if title.contains(term) {
            weight += 1.0;
        }
        if tags.iter().any(|t| t.contains(term)) {
            weight += 0.5;
        }
        if summary.contains(term) {
            weight += 0.25;
        }
        if weight == 0.0 {
            return None;
        }
        rank += weight;
    }

    Some(rank)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Truncated digest of the caller address; the address itself is never stored
pub(crate) fn submitter_hash(client_ip: &str) -> String {
    let digest = hex::encode(Sha256::digest(client_ip.as_bytes()));
    digest[..SUBMITTER_HASH_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::api_key::{ApiKeyRepository, MockApiKeyRepository};
    use crate::domain::cache::Cache;
    use crate::domain::comment::{CommentStatus, MockCommentRepository};
    use crate::domain::content::PaywallConfig;
    use crate::domain::settings::{ModerationPolicy, SiteSettings};
    use crate::domain::verification::MockHumanVerifier;
    use crate::domain::DomainError;
    use crate::infrastructure::api_key::{ApiKeyGenerator, StorageApiKeyRepository, UsageRecorder};
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::comment::StorageCommentRepository;
    use crate::infrastructure::content::StorageContentRepository;
    use crate::infrastructure::rate_limit::FailurePolicy;
    use crate::infrastructure::settings::StorageSettingsRepository;
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::infrastructure::verification::BypassVerifier;

    struct Fixture {
        content: Arc<StorageContentRepository>,
        comments: Arc<StorageCommentRepository>,
        settings: Arc<StorageSettingsRepository>,
        api_keys: ApiKeyService,
        cache: Arc<dyn Cache>,
        verifier: Arc<dyn HumanVerifier>,
    }

    impl Fixture {
        fn new() -> Self {
            let key_repo: Arc<dyn ApiKeyRepository> = Arc::new(StorageApiKeyRepository::new(
                Arc::new(InMemoryStorage::new()),
            ));

            Self {
                content: Arc::new(StorageContentRepository::new(Arc::new(
                    InMemoryStorage::new(),
                ))),
                comments: Arc::new(StorageCommentRepository::new(Arc::new(
                    InMemoryStorage::new(),
                ))),
                settings: Arc::new(StorageSettingsRepository::new(Arc::new(
                    InMemoryStorage::new(),
                ))),
                api_keys: ApiKeyService::new(
                    key_repo.clone(),
                    ApiKeyGenerator::default(),
                    UsageRecorder::spawn(key_repo, 16),
                ),
                cache: Arc::new(InMemoryCache::new()),
                verifier: Arc::new(BypassVerifier),
            }
        }

        fn with_verifier(mut self, verifier: impl HumanVerifier + 'static) -> Self {
            self.verifier = Arc::new(verifier);
            self
        }

        fn orchestrator(&self) -> AccessOrchestrator {
            AccessOrchestrator::new(AccessOrchestratorDeps {
                content: self.content.clone(),
                comments: self.comments.clone(),
                settings: self.settings.clone(),
                api_keys: self.api_keys.clone(),
                rate_limiter: RateLimiter::new(
                    self.cache.clone(),
                    Duration::from_millis(100),
                    FailurePolicy::AvailabilityOverThrottling,
                ),
                idempotency: IdempotencyCache::new(
                    self.cache.clone(),
                    Duration::from_secs(86_400),
                    Duration::from_secs(30),
                    Duration::from_millis(100),
                ),
                verifier: self.verifier.clone(),
            })
        }

        async fn publish(&self, slug: &str, body: &str, paywall: PaywallConfig) -> ContentItem {
            self.content
                .create(
                    ContentItem::new(slug, "Title", body, "dx")
                        .with_paywall(paywall)
                        .with_status(ContentStatus::Published),
                )
                .await
                .unwrap()
        }
    }

    fn comment_request(content_id: &ContentId, body: &str) -> NewCommentRequest {
        NewCommentRequest {
            content_id: Some(content_id.to_string()),
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new("203.0.113.7")
    }

    #[tokio::test]
    async fn test_read_content_hides_restricted_text() {
        let fixture = Fixture::new();
        fixture
            .publish(
                "paid",
                "free part{/* more */}secret part",
                PaywallConfig::marker().with_price(300),
            )
            .await;

        let view = fixture.orchestrator().read_content("paid").await.unwrap();

        assert_eq!(view.preview, "free part");
        assert!(view.paywall.enabled);
        assert!(view.paywall.has_restricted_content);
        assert_eq!(view.paywall.price, Some(300));
        assert!(!serde_json::to_string(&view).unwrap().contains("secret"));
    }

    #[tokio::test]
    async fn test_read_content_treats_drafts_as_missing() {
        let fixture = Fixture::new();
        fixture
            .content
            .create(ContentItem::new("draft", "Draft", "body", "dx"))
            .await
            .unwrap();

        let orchestrator = fixture.orchestrator();
        let draft = orchestrator.read_content("draft").await.unwrap_err();
        let missing = orchestrator.read_content("nope").await.unwrap_err();

        assert_eq!(draft.kind(), "not_found");
        assert_eq!(draft.to_string(), missing.to_string());
    }

    #[tokio::test]
    async fn test_list_content_prefers_summary_over_excerpt() {
        let fixture = Fixture::new();
        fixture
            .content
            .create(
                ContentItem::new("a", "A", "## Heading\nsome **body** text", "dx")
                    .with_status(ContentStatus::Published),
            )
            .await
            .unwrap();
        fixture
            .content
            .create(
                ContentItem::new("b", "B", "body", "dx")
                    .with_summary("Hand written")
                    .with_status(ContentStatus::Published),
            )
            .await
            .unwrap();

        let listing = fixture
            .orchestrator()
            .list_content(None, Some(0))
            .await
            .unwrap();
        assert_eq!(listing.len(), 1);

        let listing = fixture.orchestrator().list_content(None, None).await.unwrap();
        let a = listing.iter().find(|s| s.slug == "a").unwrap();
        let b = listing.iter().find(|s| s.slug == "b").unwrap();

        assert_eq!(a.excerpt, "Heading some body text");
        assert_eq!(b.excerpt, "Hand written");
    }

    #[tokio::test]
    async fn test_pre_moderated_comment_stays_hidden_until_approved() {
        let fixture = Fixture::new();
        let item = fixture.publish("post", "body", PaywallConfig::disabled()).await;
        let orchestrator = fixture.orchestrator();

        let response = orchestrator
            .submit_comment(&ctx(), comment_request(item.id(), "great article"))
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.body["status"], "pending");
        assert_eq!(response.body["message"], "Comment submitted for approval");

        let visible = orchestrator
            .list_approved_comments(Some(item.id().as_str()))
            .await
            .unwrap();
        assert!(visible.is_empty());

        let id = crate::domain::comment::CommentId::new(response.body["id"].as_str().unwrap());
        fixture
            .comments
            .update_status(&id, CommentStatus::Approved)
            .await
            .unwrap();

        let visible = orchestrator
            .list_approved_comments(Some(item.id().as_str()))
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].author_name, "Anonymous");
    }

    #[tokio::test]
    async fn test_post_moderation_publishes_immediately() {
        let fixture = Fixture::new();
        fixture
            .settings
            .save(SiteSettings::new(None, ModerationPolicy::Post))
            .await
            .unwrap();
        let item = fixture.publish("post", "body", PaywallConfig::disabled()).await;

        let response = fixture
            .orchestrator()
            .submit_comment(&ctx(), comment_request(item.id(), "nice"))
            .await
            .unwrap();

        assert_eq!(response.body["status"], "approved");
        assert_eq!(response.body["message"], "Comment posted successfully");
    }

    #[tokio::test]
    async fn test_same_idempotency_key_creates_one_comment() {
        let fixture = Fixture::new();
        let item = fixture.publish("post", "body", PaywallConfig::disabled()).await;
        let orchestrator = fixture.orchestrator();
        let ctx = ctx().with_idempotency_key("abc123");

        let first = orchestrator
            .submit_comment(&ctx, comment_request(item.id(), "great article"))
            .await
            .unwrap();
        let second = orchestrator
            .submit_comment(&ctx, comment_request(item.id(), "great article"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(fixture.comments.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_submission_releases_idempotency_key() {
        let fixture = Fixture::new();
        let item = fixture.publish("post", "body", PaywallConfig::disabled()).await;
        let orchestrator = fixture.orchestrator();
        let ctx = ctx().with_idempotency_key("retry-me");

        let err = orchestrator
            .submit_comment(&ctx, comment_request(item.id(), ""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let response = orchestrator
            .submit_comment(&ctx, comment_request(item.id(), "fixed"))
            .await
            .unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_overlong_idempotency_key_is_rejected() {
        let fixture = Fixture::new();
        let item = fixture.publish("post", "body", PaywallConfig::disabled()).await;
        let ctx = ctx().with_idempotency_key("k".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1));

        let err = fixture
            .orchestrator()
            .submit_comment(&ctx, comment_request(item.id(), "hi"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "validation_error");
    }

    #[tokio::test]
    async fn test_idempotency_key_length_counts_chars() {
        let fixture = Fixture::new();
        let item = fixture.publish("post", "body", PaywallConfig::disabled()).await;
        let orchestrator = fixture.orchestrator();

        // Every char here is three bytes in UTF-8
        let at_limit = ctx().with_idempotency_key("鍵".repeat(MAX_IDEMPOTENCY_KEY_LEN));
        let response = orchestrator
            .submit_comment(&at_limit, comment_request(item.id(), "hi"))
            .await
            .unwrap();
        assert_eq!(response.status, 201);

        let over = ctx().with_idempotency_key("鍵".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1));
        let err = orchestrator
            .submit_comment(&over, comment_request(item.id(), "hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }

    async fn publish_dated(
        fixture: &Fixture,
        slug: &str,
        title: &str,
        category: &str,
        tags: &[&str],
        age_days: i64,
    ) {
        fixture
            .content
            .create(
                ContentItem::new(slug, title, "hidden body words", category)
                    .with_tags(tags.iter().map(|t| t.to_string()).collect())
                    .with_published_at(chrono::Utc::now() - chrono::Duration::days(age_days))
                    .with_status(ContentStatus::Published),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_posts_pages_with_offset() {
        let fixture = Fixture::new();
        for (i, slug) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            publish_dated(&fixture, slug, slug, "dx", &[], i as i64).await;
        }
        publish_dated(&fixture, "ops", "ops", "ops", &[], 10).await;
        fixture
            .content
            .create(ContentItem::new("draft", "Draft", "body", "dx"))
            .await
            .unwrap();
        let orchestrator = fixture.orchestrator();

        let page = orchestrator
            .list_posts(Some("dx".to_string()), Some(2), Some(2))
            .await
            .unwrap();
        let slugs: Vec<&str> = page.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "d"]);
        assert_eq!(
            page.pagination,
            Pagination {
                total: 5,
                limit: 2,
                offset: 2,
                has_more: true
            }
        );

        let last = orchestrator
            .list_posts(Some("dx".to_string()), Some(2), Some(4))
            .await
            .unwrap();
        assert_eq!(last.posts.len(), 1);
        assert!(!last.pagination.has_more);

        let all = orchestrator
            .list_posts(Some(ALL_CATEGORIES.to_string()), None, None)
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 6);
        assert_eq!(all.pagination.limit, DEFAULT_LIST_LIMIT);
        assert_eq!(all.pagination.offset, 0);

        let past_end = orchestrator.list_posts(None, None, Some(50)).await.unwrap();
        assert!(past_end.posts.is_empty());
        assert!(!past_end.pagination.has_more);
    }

    #[tokio::test]
    async fn test_search_short_or_symbol_only_queries_are_empty() {
        let fixture = Fixture::new();
        publish_dated(&fixture, "rust", "Rust tips", "dx", &[], 0).await;
        let orchestrator = fixture.orchestrator();

        let short = orchestrator.search("R", None).await.unwrap();
        assert!(short.results.is_empty());
        assert_eq!(short.total, 0);
        assert_eq!(short.query, "R");

        let symbols = orchestrator.search("!!?", None).await.unwrap();
        assert!(symbols.results.is_empty());
        assert_eq!(symbols.query, "!!?");
    }

    #[tokio::test]
    async fn test_search_matches_title_and_tags_of_published_items() {
        let fixture = Fixture::new();
        publish_dated(&fixture, "older", "Async Rust", "dx", &[], 5).await;
        publish_dated(&fixture, "tagged", "Weekly notes", "dx", &["rust"], 1).await;
        publish_dated(&fixture, "other", "Go channels", "dx", &["go"], 0).await;
        fixture
            .content
            .create(ContentItem::new("draft", "Rust draft", "body", "dx"))
            .await
            .unwrap();
        let orchestrator = fixture.orchestrator();

        let found = orchestrator.search("rust!", None).await.unwrap();
        let slugs: Vec<&str> = found.results.iter().map(|r| r.slug.as_str()).collect();

        assert_eq!(slugs, vec!["older", "tagged"]);
        assert_eq!(found.total, 2);
        assert_eq!(found.query, "rust!");
        assert!(found.results.iter().all(|r| r.kind == "post"));
        assert!(found.results[0].rank > found.results[1].rank);

        let body_only = orchestrator.search("hidden", None).await.unwrap();
        assert!(body_only.results.is_empty());

        let limited = orchestrator.search("rust", Some(1)).await.unwrap();
        assert_eq!(limited.results.len(), 1);
    }

    #[test]
    fn test_sanitize_query_keeps_words_and_cjk() {
        assert_eq!(sanitize_query("  c++ & rust "), "c     rust");
        assert_eq!(sanitize_query("日本語（テスト）"), "日本語 テスト");
        assert_eq!(sanitize_query("%%%"), "");
    }

    #[tokio::test]
    async fn test_sixth_comment_in_window_is_throttled() {
        let fixture = Fixture::new();
        let item = fixture.publish("post", "body", PaywallConfig::disabled()).await;
        let orchestrator = fixture.orchestrator();

        for _ in 0..5 {
            orchestrator
                .submit_comment(&ctx(), comment_request(item.id(), "again"))
                .await
                .unwrap();
        }

        let err = orchestrator
            .submit_comment(&ctx(), comment_request(item.id(), "again"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::RateLimited));

        let other = RequestContext::new("198.51.100.1");
        assert!(orchestrator
            .submit_comment(&other, comment_request(item.id(), "hello"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_comment_on_unpublished_content_is_not_found() {
        let fixture = Fixture::new();
        let draft = fixture
            .content
            .create(ContentItem::new("draft", "Draft", "body", "dx"))
            .await
            .unwrap();
        let orchestrator = fixture.orchestrator();

        let err = orchestrator
            .submit_comment(&ctx(), comment_request(draft.id(), "hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");

        let err = orchestrator
            .submit_comment(&ctx(), comment_request(&ContentId::new("missing"), "hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_missing_and_rejected_verification_differ() {
        let mut verifier = MockHumanVerifier::new();
        verifier.expect_is_required().return_const(true);
        verifier.expect_verify().returning(|_, _| Ok(false));

        let fixture = Fixture::new().with_verifier(verifier);
        let item = fixture.publish("post", "body", PaywallConfig::disabled()).await;
        let orchestrator = fixture.orchestrator();

        let missing = orchestrator
            .submit_comment(&ctx(), comment_request(item.id(), "hi"))
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), "validation_error");

        let mut request = comment_request(item.id(), "hi");
        request.verification_token = Some("bad".to_string());
        let rejected = orchestrator.submit_comment(&ctx(), request).await.unwrap_err();
        assert_eq!(rejected.kind(), "verification_failed");

        assert!(fixture.comments.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_store_failure_is_a_dependency_error() {
        let fixture = Fixture::new();
        let item = fixture.publish("post", "body", PaywallConfig::disabled()).await;

        let mut comments = MockCommentRepository::new();
        comments
            .expect_create()
            .returning(|_| Err(DomainError::storage("connection reset")));

        let mut deps = fixture.orchestrator().deps;
        deps.comments = Arc::new(comments);
        let orchestrator = AccessOrchestrator::new(deps);

        let err = orchestrator
            .submit_comment(&ctx(), comment_request(item.id(), "hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "dependency_error");
    }

    #[tokio::test]
    async fn test_stored_comment_keeps_only_address_digest() {
        let fixture = Fixture::new();
        let item = fixture.publish("post", "body", PaywallConfig::disabled()).await;

        let mut request = comment_request(item.id(), "hi");
        request.author_name = Some("  Reader ".to_string());
        request.author_email = Some(" ".to_string());

        fixture
            .orchestrator()
            .submit_comment(&ctx(), request)
            .await
            .unwrap();

        let stored = fixture.comments.list(None).await.unwrap();
        assert_eq!(stored[0].author_name(), "Reader");
        assert_eq!(stored[0].author_email(), None);
        assert_eq!(stored[0].submitter_hash(), submitter_hash("203.0.113.7"));
        assert_eq!(stored[0].submitter_hash().len(), 16);
        assert!(!serde_json::to_string(&stored[0]).unwrap().contains("203.0.113.7"));
    }

    #[tokio::test]
    async fn test_create_content_records_principal_and_defaults() {
        let fixture = Fixture::new();
        let orchestrator = fixture.orchestrator();
        let created = fixture
            .api_keys
            .create("publisher", None)
            .await
            .unwrap();

        let caller = orchestrator
            .authenticate(Some(&created.secret))
            .await
            .unwrap();

        let item = orchestrator
            .create_content(
                &caller,
                NewContentRequest {
                    slug: Some("new-post".to_string()),
                    title: Some("New".to_string()),
                    body: Some("text".to_string()),
                    category: Some("dx".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(item.created_by(), Some("publisher"));
        assert_eq!(item.status(), ContentStatus::Draft);
        assert_eq!(item.paywall(), &PaywallConfig::default());
    }

    #[tokio::test]
    async fn test_create_content_rejects_missing_fields_and_duplicates() {
        let fixture = Fixture::new();
        let orchestrator = fixture.orchestrator();
        let caller = AuthenticatedKey {
            id: crate::domain::api_key::ApiKeyId::new("k1"),
            name: "ci".to_string(),
            principal: "ci".to_string(),
        };

        let err = orchestrator
            .create_content(&caller, NewContentRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields");

        let request = NewContentRequest {
            slug: Some("dup".to_string()),
            title: Some("Dup".to_string()),
            body: Some("text".to_string()),
            category: Some("dx".to_string()),
            ..Default::default()
        };
        orchestrator
            .create_content(&caller, request.clone())
            .await
            .unwrap();
        let err = orchestrator
            .create_content(&caller, request)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "conflict");
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_keys_are_indistinguishable() {
        let fixture = Fixture::new();
        let orchestrator = fixture.orchestrator();
        let created = fixture.api_keys.create("old", None).await.unwrap();
        fixture
            .api_keys
            .set_active(created.api_key.id(), false)
            .await
            .unwrap();

        let inactive = orchestrator
            .authenticate(Some(&created.secret))
            .await
            .unwrap_err();
        let unknown = orchestrator
            .authenticate(Some("blog_doesnotexist0000000000000000000"))
            .await
            .unwrap_err();
        let absent = orchestrator.authenticate(None).await.unwrap_err();

        for err in [&inactive, &unknown, &absent] {
            assert!(matches!(err, AccessError::Authentication));
        }
    }

    #[tokio::test]
    async fn test_key_store_failure_fails_closed() {
        let mut repo = MockApiKeyRepository::new();
        repo.expect_find_by_secret_hash()
            .returning(|_| Err(DomainError::storage("down")));
        let repo: Arc<dyn ApiKeyRepository> = Arc::new(repo);

        let fixture = Fixture::new();
        let mut deps = fixture.orchestrator().deps;
        deps.api_keys = ApiKeyService::new(
            repo.clone(),
            ApiKeyGenerator::default(),
            UsageRecorder::spawn(repo, 4),
        );

        let err = AccessOrchestrator::new(deps)
            .authenticate(Some("blog_anything"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "dependency_error");
    }

    #[test]
    fn test_submitter_hash_is_stable_and_truncated() {
        assert_eq!(submitter_hash("::1"), submitter_hash("::1"));
        assert_ne!(submitter_hash("::1"), submitter_hash("127.0.0.1"));
        assert_eq!(submitter_hash("::1").len(), SUBMITTER_HASH_LEN);
    }
}
