//! Infrastructure layer - Storage, cache and service implementations

pub mod access;
pub mod api_key;
pub mod cache;
pub mod comment;
pub mod content;
pub mod idempotency;
pub mod logging;
pub mod rate_limit;
pub mod settings;
pub mod storage;
pub mod verification;
