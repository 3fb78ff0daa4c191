//! Idempotent handling of retried writes

mod cache;

pub use cache::{
    IdempotencyCache, IdempotencyCheck, Reservation, StoredResponse, MAX_IDEMPOTENCY_KEY_LEN,
};
