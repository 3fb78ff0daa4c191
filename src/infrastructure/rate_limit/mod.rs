//! Fixed-window rate limiting over the shared cache

mod limiter;

pub use limiter::{FailurePolicy, RateLimitPolicy, RateLimiter};
