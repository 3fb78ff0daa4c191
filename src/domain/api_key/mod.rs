//! API key domain
//!
//! Keys are issued to automation clients. Only a digest of the secret is
//! stored; the plaintext is shown once at creation.

mod entity;
mod repository;

pub use entity::{ApiKey, ApiKeyId, AuthenticatedKey};
pub use repository::ApiKeyRepository;

#[cfg(test)]
pub use repository::MockApiKeyRepository;
