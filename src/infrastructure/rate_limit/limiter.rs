//! Fixed-window rate limiter
//!
//! Each subject gets a counter that expires `window` after its first hit.
//! Later hits never move the deadline.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::cache::Cache;

/// What to do when the counter store cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Admit the request
    #[default]
    AvailabilityOverThrottling,
    /// Reject the request
    StrictThrottling,
}

/// Limit applied to one action
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub action: &'static str,
    pub limit: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Comment submissions per client address
    pub fn comments(limit: u32, window: Duration) -> Self {
        Self {
            action: "comment",
            limit,
            window,
        }
    }

    /// Counter key for a subject
    pub fn subject_key(&self, subject: &str) -> String {
        format!("rate:{}:{}", self.action, subject)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::comments(5, Duration::from_secs(600))
    }
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    cache: Arc<dyn Cache>,
    operation_timeout: Duration,
    failure_policy: FailurePolicy,
}

impl RateLimiter {
    pub fn new(
        cache: Arc<dyn Cache>,
        operation_timeout: Duration,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            cache,
            operation_timeout,
            failure_policy,
        }
    }

    /// Count a hit for `subject_key` and report whether it is within `limit`
    pub async fn allow(&self, subject_key: &str, limit: u32, window: Duration) -> bool {
        let hit = tokio::time::timeout(
            self.operation_timeout,
            self.cache.increment_with_expiry(subject_key, window),
        )
        .await;

        let error = match hit {
            Ok(Ok(count)) => return count <= i64::from(limit),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {:?}", self.operation_timeout),
        };

        let admitted = self.failure_policy == FailurePolicy::AvailabilityOverThrottling;
        warn!(
            subject_key,
            error = %error,
            policy = ?self.failure_policy,
            admitted,
            "Rate limit store unavailable"
        );

        admitted
    }

    /// Apply a named policy to a subject
    pub async fn check(&self, policy: &RateLimitPolicy, subject: &str) -> bool {
        self.allow(&policy.subject_key(subject), policy.limit, policy.window)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{MockCache, StalledCache};
    use crate::infrastructure::cache::InMemoryCache;

    fn limiter(cache: Arc<dyn Cache>, policy: FailurePolicy) -> RateLimiter {
        RateLimiter::new(cache, Duration::from_millis(100), policy)
    }

    #[tokio::test]
    async fn test_sixth_call_in_window_is_rejected() {
        let limiter = limiter(Arc::new(InMemoryCache::new()), FailurePolicy::default());

        let mut results = Vec::new();
        for _ in 0..6 {
            results.push(
                limiter
                    .allow("rate:comment:1.2.3.4", 5, Duration::from_secs(600))
                    .await,
            );
        }

        assert_eq!(results, vec![true, true, true, true, true, false]);
    }

    #[tokio::test]
    async fn test_subjects_are_counted_separately() {
        let limiter = limiter(Arc::new(InMemoryCache::new()), FailurePolicy::default());
        let policy = RateLimitPolicy::comments(1, Duration::from_secs(600));

        assert!(limiter.check(&policy, "1.1.1.1").await);
        assert!(!limiter.check(&policy, "1.1.1.1").await);
        assert!(limiter.check(&policy, "2.2.2.2").await);
    }

    #[tokio::test]
    async fn test_new_window_after_expiry() {
        let limiter = limiter(Arc::new(InMemoryCache::new()), FailurePolicy::default());
        let window = Duration::from_millis(30);

        assert!(limiter.allow("k", 1, window).await);
        assert!(!limiter.allow("k", 1, window).await);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.allow("k", 1, window).await);
    }

    #[tokio::test]
    async fn test_store_error_fails_open_by_default() {
        let cache = Arc::new(MockCache::new().with_error("connection refused"));
        let limiter = limiter(cache, FailurePolicy::AvailabilityOverThrottling);

        for _ in 0..10 {
            assert!(limiter.allow("k", 1, Duration::from_secs(60)).await);
        }
    }

    #[tokio::test]
    async fn test_store_error_rejects_under_strict_policy() {
        let cache = Arc::new(MockCache::new().with_error("connection refused"));
        let limiter = limiter(cache, FailurePolicy::StrictThrottling);

        assert!(!limiter.allow("k", 5, Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn test_slow_store_times_out_and_fails_open() {
        let limiter = RateLimiter::new(
            Arc::new(StalledCache),
            Duration::from_millis(20),
            FailurePolicy::AvailabilityOverThrottling,
        );

        assert!(limiter.allow("k", 1, Duration::from_secs(60)).await);
    }

    #[test]
    fn test_comment_policy_defaults() {
        let policy = RateLimitPolicy::default();

        assert_eq!(policy.limit, 5);
        assert_eq!(policy.window, Duration::from_secs(600));
        assert_eq!(policy.subject_key("10.0.0.1"), "rate:comment:10.0.0.1");
    }

    #[test]
    fn test_failure_policy_names() {
        let policy: FailurePolicy = serde_json::from_str("\"strict_throttling\"").unwrap();
        assert_eq!(policy, FailurePolicy::StrictThrottling);
    }
}
