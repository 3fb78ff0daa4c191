//! Idempotency cache
//!
//! A fresh key is reserved with an atomic insert-if-absent of a pending
//! placeholder before any side effect runs. On success the placeholder is
//! replaced by the completed response for the retention period; on failure
//! it is removed so the caller may retry.
//!
//! If the process dies between persisting and committing, the placeholder
//! simply expires and a retry with the same key runs the write again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::cache::{Cache, CacheExt};
use crate::domain::DomainError;

/// Longest accepted caller-supplied key, in chars
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Response replayed verbatim for a retried request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
enum IdempotencyRecord {
    Pending {
        reserved_at: DateTime<Utc>,
    },
    Completed {
        response: StoredResponse,
        completed_at: DateTime<Utc>,
    },
}

/// Proof that this request owns a key
#[derive(Debug)]
#[must_use = "a reservation must be committed or released"]
pub struct Reservation {
    cache_key: String,
}

/// Outcome of looking up a key
#[derive(Debug)]
pub enum IdempotencyCheck {
    /// No key was supplied, or the store is unavailable
    Disabled,
    /// The key is fresh and now held by this request
    Reserved(Reservation),
    /// A previous request with this key completed
    Cached(StoredResponse),
    /// Another request holding this key has not finished yet
    InFlight,
}

#[derive(Debug, Clone)]
pub struct IdempotencyCache {
    cache: Arc<dyn Cache>,
    retention: Duration,
    reservation_ttl: Duration,
    operation_timeout: Duration,
}

impl IdempotencyCache {
    pub fn new(
        cache: Arc<dyn Cache>,
        retention: Duration,
        reservation_ttl: Duration,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            retention,
            reservation_ttl,
            operation_timeout,
        }
    }

    fn cache_key(key: &str) -> String {
        format!("idempotency:{}", key)
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, DomainError>>,
    ) -> Result<T, DomainError> {
        tokio::time::timeout(self.operation_timeout, op)
            .await
            .map_err(|_| {
                DomainError::cache(format!("timed out after {:?}", self.operation_timeout))
            })?
    }

    /// Return the stored response for `key`, or reserve it for this request
    pub async fn check_and_reserve(&self, key: Option<&str>) -> IdempotencyCheck {
        let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
            return IdempotencyCheck::Disabled;
        };

        match self.try_reserve(&Self::cache_key(key)).await {
            Ok(check) => check,
            Err(e) => {
                warn!(error = %e, "Idempotency store unavailable, proceeding without idempotency");
                IdempotencyCheck::Disabled
            }
        }
    }

    async fn try_reserve(&self, cache_key: &str) -> Result<IdempotencyCheck, DomainError> {
        let placeholder = IdempotencyRecord::Pending {
            reserved_at: Utc::now(),
        };

        // A second attempt covers a record expiring between the two calls.
        for _ in 0..2 {
            let reserved = self
                .bounded(self.cache.set_nx(cache_key, &placeholder, self.reservation_ttl))
                .await?;

            if reserved {
                return Ok(IdempotencyCheck::Reserved(Reservation {
                    cache_key: cache_key.to_string(),
                }));
            }

            let existing: Option<IdempotencyRecord> =
                self.bounded(self.cache.get(cache_key)).await?;

            match existing {
                Some(IdempotencyRecord::Completed { response, .. }) => {
                    debug!(cache_key, "Replaying stored response");
                    return Ok(IdempotencyCheck::Cached(response));
                }
                Some(IdempotencyRecord::Pending { .. }) => return Ok(IdempotencyCheck::InFlight),
                None => continue,
            }
        }

        Ok(IdempotencyCheck::InFlight)
    }

    /// Store the final response under a reserved key
    pub async fn commit(&self, reservation: Reservation, response: &StoredResponse) {
        let record = IdempotencyRecord::Completed {
            response: response.clone(),
            completed_at: Utc::now(),
        };

        let result = self
            .bounded(
                self.cache
                    .set(&reservation.cache_key, &record, self.retention),
            )
            .await;

        if let Err(e) = result {
            warn!(error = %e, "Failed to store idempotent response");
        }
    }

    /// Give up a reservation after a failed request
    pub async fn release(&self, reservation: Reservation) {
        if let Err(e) = self
            .bounded(self.cache.delete(&reservation.cache_key))
            .await
        {
            warn!(error = %e, "Failed to release idempotency reservation");
        }
    }
}
