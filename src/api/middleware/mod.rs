//! API middleware and request extractors

pub mod admin_auth;
pub mod auth;
pub mod client;
pub mod logging;
pub mod security;

pub use admin_auth::{AdminCredentials, RequireAdmin};
pub use auth::RequireApiKey;
pub use client::{ClientIp, IdempotencyKey};
pub use logging::logging_middleware;
pub use security::security_headers_middleware;
