//! API key infrastructure
//!
//! Key generation and hashing, storage-backed persistence, authentication
//! and asynchronous usage metering.

mod generator;
mod service;
mod storage_repository;
mod usage;

pub(crate) use generator::constant_time_compare;
pub use generator::{ApiKeyGenerator, GeneratedApiKey, DEFAULT_KEY_PREFIX};
pub use service::{ApiKeyService, CreatedApiKey};
pub use storage_repository::StorageApiKeyRepository;
pub use usage::UsageRecorder;
